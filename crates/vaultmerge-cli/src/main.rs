//! vaultmerge - deduplicate password-manager vault exports
//!
//! Collapses duplicate folders and items in an unencrypted JSON export, with
//! optional interactive review of the remaining duplicate groups.

mod app;
mod config;
mod handlers;
mod report;
mod ui;

use anyhow::Result;
use clap::Parser;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vaultmerge_core::MergePolicy;

use app::{App, Settings};
use config::Config;

/// vaultmerge - deduplicate password-manager vault exports
#[derive(Parser, Debug)]
#[command(name = "vaultmerge")]
#[command(about = "Deduplicate folders and items in a JSON vault export")]
struct Args {
    /// Path to the unencrypted JSON export
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write the deduplicated export
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Merge duplicates instead of keeping only the latest revision
    #[arg(short, long)]
    merge: bool,

    /// Keep all duplicate items and resolve them interactively
    #[arg(long, conflicts_with = "merge")]
    review: bool,

    /// Print every folder and item decision
    #[arg(short, long)]
    verbose: bool,

    /// Walk remaining duplicate groups interactively
    #[arg(long)]
    interactive: bool,

    /// Skip writing the Markdown report
    #[arg(long)]
    no_report: bool,

    /// Path to a config file (default: ~/.config/vaultmerge/vaultmerge.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Args {
    fn into_settings(self, config: &Config) -> Settings {
        let policy = if self.review {
            MergePolicy::KeepAll
        } else {
            MergePolicy::from_merge_mode(self.merge || config.merge_mode)
        };

        Settings {
            input: self.input,
            output: self.output,
            policy,
            verbose: self.verbose || config.verbose,
            interactive: self.review || self.interactive || config.interactive,
            write_report: config.write_report && !self.no_report,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("vaultmerge=info".parse()?)
                .add_directive("vaultmerge_core=info".parse()?),
        )
        .with_writer(std::io::stderr) // Keep stdout for the operator dialogue
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.clone())?;
    let settings = args.into_settings(&config);
    tracing::info!("Starting vaultmerge with {:?}", settings);

    let app = App::new(settings);
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let summary = app.run(stdin.lock(), &mut stdout)?;

    tracing::info!(
        "Done: removed {} folders and {} items",
        summary.removed_folders(),
        summary.removed_records()
    );
    Ok(())
}
