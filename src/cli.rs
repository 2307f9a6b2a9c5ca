//! clap-based command line interface.

use clap::{Parser, Subcommand};

/// pagetest — visual page test runner driving a browser over WebDriver.
#[derive(Debug, Parser)]
#[command(name = "pagetest", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug-level logging.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load a page and run its test jobs to completion.
    Run {
        /// URL of the page under test.
        url: String,

        /// Snapshot name prefix (defaults to a slug of the URL).
        #[arg(long)]
        name: Option<String>,

        /// Do not fail the run when the page calls console.error().
        #[arg(long)]
        ignore_console_error: bool,

        /// Do not fail the run on page errors surfaced by the harness.
        #[arg(long)]
        ignore_page_error: bool,

        /// Overwrite stored baselines with freshly captured screenshots.
        #[arg(long)]
        update_snapshots: bool,
    },

    /// Remove diff artifacts left by failed runs.
    Clean,
}
