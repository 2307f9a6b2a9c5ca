use thiserror::Error;

use crate::webdriver::WebDriverError;

/// Everything that can fail a page test run.
///
/// The first six variants are the harness-level failure kinds; the rest are
/// conversions from the collaborators the runner drives (browser session,
/// snapshot storage, image decoding).
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A required page-side global is absent. Fatal before any job is observed.
    #[error("\"{0}\" is not loaded on the page")]
    MissingDependency(String),

    /// The job stream emitted a job type the runner does not recognize.
    /// Rejects that job's own acknowledgment handle only.
    #[error("unknown job type \"{0}\"")]
    UnknownJobType(String),

    /// A screenshot did not match its stored baseline. Fatal for the run.
    #[error(
        "snapshot \"{name}\" does not match baseline: {diff_pixels} pixels differ ({diff_ratio:.4} of image)"
    )]
    SnapshotMismatch {
        name: String,
        diff_pixels: u64,
        diff_ratio: f64,
    },

    /// console.error() was called in the browser during the run.
    #[error(
        "console.error() was called in the browser ({0} entries); set ignore_console_error if console errors are okay to ignore"
    )]
    ConsoleErrorDetected(usize),

    /// The job stream itself errored (page error, poll failure).
    #[error("job stream error: {0}")]
    Stream(String),

    /// The run was cancelled from the outside.
    #[error("test aborted")]
    TestAborted,

    #[error("webdriver error: {0}")]
    Driver(#[from] WebDriverError),

    #[error("snapshot storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_dependency_names_the_script() {
        let err = HarnessError::MissingDependency("webchat.js".into());
        assert_eq!(err.to_string(), "\"webchat.js\" is not loaded on the page");
    }

    #[test]
    fn unknown_job_type_names_the_type() {
        let err = HarnessError::UnknownJobType("bogus".into());
        assert_eq!(err.to_string(), "unknown job type \"bogus\"");
    }

    #[test]
    fn snapshot_mismatch_reports_diff() {
        let err = HarnessError::SnapshotMismatch {
            name: "page-1".into(),
            diff_pixels: 12,
            diff_ratio: 0.25,
        };
        let msg = err.to_string();
        assert!(msg.contains("page-1"));
        assert!(msg.contains("12 pixels"));
        assert!(msg.contains("0.2500"));
    }

    #[test]
    fn console_error_mentions_ignore_flag() {
        let err = HarnessError::ConsoleErrorDetected(3);
        assert!(err.to_string().contains("ignore_console_error"));
    }
}
