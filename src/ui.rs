//! Terminal output — spinner while a run is in flight, colored verdict after.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::HarnessError;

/// Visual progress for one page test run.
pub struct RunProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
}

impl RunProgress {
    /// Start the spinner for the page under test.
    pub fn start(url: &str, started_at: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("invalid template"),
        );
        pb.set_message(format!("Testing {url} (started {started_at})"));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
        }
    }

    /// Clear the spinner and print the run verdict.
    pub fn finish(&self, outcome: &Result<(), HarnessError>) {
        self.pb.finish_and_clear();
        match outcome {
            Ok(()) => {
                println!("  {} Page test passed", self.green.apply_to("✓"));
            }
            Err(err) => {
                println!("  {} Page test failed: {err}", self.red.apply_to("✗"));
            }
        }
    }
}
