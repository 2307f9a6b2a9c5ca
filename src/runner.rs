//! Drives one page-level test run to a single settled outcome.
//!
//! Control flow: precondition checks, then a subscription to the page's job
//! stream, per-job handling with acknowledgment back to the stream, a
//! console-error check once the stream completes, and unconditional teardown
//! of the subscription.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::deferred::{Deferred, deferred};
use crate::error::HarnessError;
use crate::jobs::{self, JobEvent, SNAPSHOT, StreamOptions};
use crate::snapshot::{SnapshotMatcher, SnapshotOptions};
use crate::webdriver::{PageDriver, WebDriverError};

pub(crate) const CHECK_WEBCHAT: &str = "return !!window.WebChat";
pub(crate) const CHECK_TEST_HARNESS: &str = "return !!window.WebChatTest";
pub(crate) const CHECK_UI_LIBRARIES: &str =
    "return !!(window.React && window.ReactDOM && window.ReactTestUtils)";
pub(crate) const CONSOLE_ERROR_COUNT: &str =
    "return window.WebChatTest.getConsoleHistory().filter(entry => entry.level === 'error').length";

#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Do not fail the run when the page called console.error().
    pub ignore_console_error: bool,
    /// Passed through to job-stream construction; page errors are then
    /// neither read nor fatal.
    pub ignore_page_error: bool,
    pub poll_interval: Duration,
    pub snapshot: SnapshotOptions,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            ignore_console_error: false,
            ignore_page_error: false,
            poll_interval: Duration::from_millis(200),
            snapshot: SnapshotOptions::default(),
        }
    }
}

/// Run the page test to completion.
///
/// Resolves with `()` when the job stream completes cleanly and no disallowed
/// console errors occurred. Rejects with the first terminal error otherwise:
/// missing page dependency, snapshot mismatch, stream error, console errors
/// at completion, or cancellation. The job-stream subscription is torn down
/// on every exit path.
pub async fn run_page_processor<D: PageDriver + 'static>(
    driver: Arc<D>,
    options: RunnerOptions,
    cancel: CancellationToken,
) -> Result<(), HarnessError> {
    check_dependency(driver.as_ref(), CHECK_WEBCHAT, "webchat.js").await?;
    check_dependency(driver.as_ref(), CHECK_TEST_HARNESS, "testharness.js").await?;
    check_dependency(
        driver.as_ref(),
        CHECK_UI_LIBRARIES,
        "react, react-dom and react-test-utils",
    )
    .await?;
    debug!("page dependencies present");

    let (events, subscription) = jobs::subscribe(
        driver.clone(),
        StreamOptions {
            ignore_page_error: options.ignore_page_error,
            poll_interval: options.poll_interval,
        },
    );

    let (result, settled) = deferred::<(), HarnessError>();
    let matcher = Arc::new(SnapshotMatcher::new(options.snapshot.clone()));
    let dispatch = tokio::spawn(dispatch_events(
        events,
        driver.clone(),
        matcher,
        result.clone(),
        options.ignore_console_error,
    ));
    // Settlement now belongs to the dispatch loop and the per-job handlers;
    // holding our clone would keep the cell alive past a dispatch failure.
    drop(result);

    let outcome = tokio::select! {
        outcome = settled.wait() => outcome.unwrap_or_else(|| {
            Err(HarnessError::Stream("job stream ended without completing".into()))
        }),
        () = cancel.cancelled() => Err(HarnessError::TestAborted),
    };

    // Teardown runs no matter how the result settled.
    subscription.unsubscribe();
    dispatch.abort();
    outcome
}

/// Sequential consumer over the job-stream events. Each job is handled on its
/// own task, so job N+1 can start while job N is still comparing.
async fn dispatch_events<D: PageDriver + 'static>(
    mut events: UnboundedReceiver<JobEvent>,
    driver: Arc<D>,
    matcher: Arc<SnapshotMatcher>,
    result: Deferred<(), HarnessError>,
    ignore_console_error: bool,
) {
    while let Some(event) = events.recv().await {
        match event {
            JobEvent::Next { job, deferred } => {
                let driver = Arc::clone(&driver);
                let matcher = Arc::clone(&matcher);
                let result = result.clone();
                tokio::spawn(async move {
                    if job.job_type == SNAPSHOT {
                        let compared = match driver.take_screenshot().await {
                            Ok(png) => matcher.matches(&png),
                            Err(err) => Err(err.into()),
                        };
                        match compared {
                            Ok(()) => deferred.resolve(),
                            Err(err) => {
                                // One failing snapshot fails the whole run.
                                deferred.reject(err.to_string());
                                result.reject(err);
                            }
                        }
                    } else {
                        // An unrecognized type rejects only this job's own
                        // handle; the overall result is left untouched.
                        deferred.reject(HarnessError::UnknownJobType(job.job_type).to_string());
                    }
                });
            }
            JobEvent::Error(err) => {
                result.reject(err);
                break;
            }
            JobEvent::Complete => {
                match console_error_count(driver.as_ref()).await {
                    Ok(count) if !ignore_console_error && count > 0 => {
                        result.reject(HarnessError::ConsoleErrorDetected(count));
                    }
                    Ok(_) => result.resolve(()),
                    Err(err) => result.reject(err.into()),
                }
                break;
            }
        }
    }
}

async fn check_dependency<D: PageDriver>(
    driver: &D,
    script: &str,
    dependency: &str,
) -> Result<(), HarnessError> {
    let loaded = driver.execute_script(script, vec![]).await?;
    if loaded.as_bool().unwrap_or(false) {
        Ok(())
    } else {
        Err(HarnessError::MissingDependency(dependency.into()))
    }
}

async fn console_error_count<D: PageDriver>(driver: &D) -> Result<usize, WebDriverError> {
    let value = driver.execute_script(CONSOLE_ERROR_COUNT, vec![]).await?;
    Ok(value.as_u64().unwrap_or(0) as usize)
}
