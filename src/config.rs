//! Harness configuration loaded from `pagetest.toml`.
//!
//! Values missing from the file use sensible defaults. The `WEBDRIVER_URL`
//! environment variable takes precedence over the file for the driver
//! endpoint, so CI can point runs at its own driver without editing config.

use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

/// Top-level configuration loaded from `pagetest.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct HarnessConfig {
    /// WebDriver endpoint (chromedriver listens on 9515 by default).
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Baseline snapshot storage directory.
    #[serde(default = "default_snapshots_dir")]
    pub snapshots_dir: String,

    /// Job-stream poll interval in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Locale tag for run timestamps.
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Do not fail runs on console.error() calls in the page.
    #[serde(default)]
    pub ignore_console_error: bool,

    /// Do not fail runs on page errors surfaced by the test harness.
    #[serde(default)]
    pub ignore_page_error: bool,
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".to_string()
}

fn default_snapshots_dir() -> String {
    "__image_snapshots__".to_string()
}

fn default_poll_interval_ms() -> u64 {
    200
}

fn default_locale() -> String {
    "en-US".to_string()
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            snapshots_dir: default_snapshots_dir(),
            poll_interval_ms: default_poll_interval_ms(),
            locale: default_locale(),
            ignore_console_error: false,
            ignore_page_error: false,
        }
    }
}

impl HarnessConfig {
    /// Load configuration from `pagetest.toml` in the current directory,
    /// falling back to defaults when the file is absent.
    pub fn load() -> Result<Self> {
        let path = Path::new("pagetest.toml");
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<HarnessConfig>(&contents)?
        } else {
            Self::default()
        };

        // Environment takes precedence over the file for the driver endpoint.
        if let Ok(url) = std::env::var("WEBDRIVER_URL")
            && !url.is_empty()
        {
            config.webdriver_url = url;
        }

        Ok(config)
    }
}
