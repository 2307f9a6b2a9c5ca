mod cli;
mod config;
mod datefmt;
mod deferred;
mod error;
mod jobs;
mod runner;
mod snapshot;
mod ui;
mod webdriver;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use config::HarnessConfig;
use datefmt::DateFormatter;
use runner::RunnerOptions;
use snapshot::SnapshotOptions;
use ui::RunProgress;
use webdriver::WebDriverClient;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = HarnessConfig::load()?;

    match cli.command {
        Command::Run {
            url,
            name,
            ignore_console_error,
            ignore_page_error,
            update_snapshots,
        } => {
            let options = RunnerOptions {
                ignore_console_error: ignore_console_error || config.ignore_console_error,
                ignore_page_error: ignore_page_error || config.ignore_page_error,
                poll_interval: Duration::from_millis(config.poll_interval_ms),
                snapshot: SnapshotOptions {
                    snapshots_dir: config.snapshots_dir.clone().into(),
                    name: name.unwrap_or_else(|| slug_of(&url)),
                    update_snapshots,
                    ..Default::default()
                },
            };
            run(&config, &url, options).await
        }
        Command::Clean => clean(&config),
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "pagetest=debug" } else { "pagetest=warn" })
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(config: &HarnessConfig, url: &str, options: RunnerOptions) -> Result<()> {
    let driver = Arc::new(
        WebDriverClient::new_session(&config.webdriver_url)
            .await
            .context("failed to open WebDriver session")?,
    );
    driver
        .navigate(url)
        .await
        .context("failed to navigate to page under test")?;

    // Ctrl-C aborts the in-flight run through the cancellation token.
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    let started_at = DateFormatter::for_locale(&config.locale).format(chrono::Utc::now());
    let progress = RunProgress::start(url, &started_at);

    let outcome = runner::run_page_processor(driver.clone(), options, cancel).await;

    if let Err(err) = driver.quit().await {
        tracing::warn!(%err, "failed to close WebDriver session");
    }
    progress.finish(&outcome);
    outcome?;
    Ok(())
}

fn clean(config: &HarnessConfig) -> Result<()> {
    let diff_dir = std::path::Path::new(&config.snapshots_dir).join("__diff_output__");
    if diff_dir.exists() {
        std::fs::remove_dir_all(&diff_dir)?;
        println!("Removed {}", diff_dir.display());
    } else {
        println!("No diff artifacts to remove.");
    }
    Ok(())
}

/// Derive a filesystem-safe snapshot prefix from the page URL.
fn slug_of(url: &str) -> String {
    let slug: String = url
        .trim_start_matches("http://")
        .trim_start_matches("https://")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    slug.trim_matches('-').to_string()
}
