//! Channel-backed replacement for the page's push-based job observable.
//!
//! A spawned task polls the page-side harness on an interval, turning its job
//! queue into a sequence of [`JobEvent`]s delivered over an unbounded channel.
//! `Complete` is emitted only once the queue is drained and the page reports
//! done, so every `Next` is delivered before `Complete` — the same ordering
//! the original observable guaranteed. Acknowledgments travel the other way:
//! each [`JobDeferred`] feeds an ack channel serviced by the same task, which
//! relays the outcome to the page.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::job::{JobAck, JobDeferred, PageJob};
use crate::error::HarnessError;
use crate::webdriver::{PageDriver, WebDriverError};

pub(crate) const TAKE_PAGE_ERRORS: &str = "return window.WebChatTest.takePageErrors()";
pub(crate) const NEXT_JOB: &str = "return window.WebChatTest.jobQueue.shift() || null";
pub(crate) const STREAM_DONE: &str = "return !!window.WebChatTest.done";
pub(crate) const RESOLVE_JOB: &str = "window.WebChatTest.resolveJob(arguments[0])";
pub(crate) const REJECT_JOB: &str =
    "window.WebChatTest.rejectJob(arguments[0], arguments[1])";

/// Event delivered to the runner's dispatch loop.
#[derive(Debug)]
pub enum JobEvent {
    /// A job was dequeued; acknowledge it through `deferred`.
    Next { job: PageJob, deferred: JobDeferred },
    /// The stream itself failed. Terminal.
    Error(HarnessError),
    /// All jobs have been delivered and the page reports done. Terminal.
    Complete,
}

#[derive(Debug, Clone)]
pub struct StreamOptions {
    /// Skip the page-error drain entirely; page errors neither fail the run
    /// nor get read.
    pub ignore_page_error: bool,
    pub poll_interval: Duration,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            ignore_page_error: false,
            poll_interval: Duration::from_millis(200),
        }
    }
}

/// Handle over the polling task. Unsubscribing aborts it; the guard makes the
/// abort happen at most once even though Drop also funnels through it.
pub struct Subscription {
    task: JoinHandle<()>,
    unsubscribed: AtomicBool,
}

impl Subscription {
    pub fn unsubscribe(&self) {
        if !self.unsubscribed.swap(true, Ordering::SeqCst) {
            self.task.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Start watching the page for jobs. Returns the event channel and the
/// subscription handle that stops the watcher.
pub fn subscribe<D: PageDriver + 'static>(
    driver: Arc<D>,
    options: StreamOptions,
) -> (mpsc::UnboundedReceiver<JobEvent>, Subscription) {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(poll_loop(driver, options, event_tx));
    (
        event_rx,
        Subscription {
            task,
            unsubscribed: AtomicBool::new(false),
        },
    )
}

enum Poll {
    Continue,
    Complete,
}

async fn poll_loop<D: PageDriver>(
    driver: Arc<D>,
    options: StreamOptions,
    events: UnboundedSender<JobEvent>,
) {
    let (ack_tx, mut ack_rx) = mpsc::unbounded_channel::<JobAck>();
    let mut ticker = tokio::time::interval(options.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            Some(ack) = ack_rx.recv() => {
                if let Err(err) = relay_ack(driver.as_ref(), &ack).await {
                    let _ = events.send(JobEvent::Error(err.into()));
                    return;
                }
            }
            _ = ticker.tick() => {
                match poll_once(driver.as_ref(), &options, &events, &ack_tx).await {
                    Ok(Poll::Continue) => {}
                    Ok(Poll::Complete) => break,
                    Err(err) => {
                        let _ = events.send(JobEvent::Error(err));
                        return;
                    }
                }
            }
        }
    }

    // The stream is complete but jobs may still be in flight. Drop our
    // sender so the drain ends once every outstanding deferred is consumed.
    drop(ack_tx);
    while let Some(ack) = ack_rx.recv().await {
        if let Err(err) = relay_ack(driver.as_ref(), &ack).await {
            warn!(id = ack.id, %err, "failed to relay acknowledgment to page");
            return;
        }
    }
}

/// One poll round: drain page errors, drain the job queue, check for done.
async fn poll_once<D: PageDriver>(
    driver: &D,
    options: &StreamOptions,
    events: &UnboundedSender<JobEvent>,
    ack_tx: &UnboundedSender<JobAck>,
) -> Result<Poll, HarnessError> {
    if !options.ignore_page_error {
        let value = driver.execute_script(TAKE_PAGE_ERRORS, vec![]).await?;
        let errors: Vec<String> = serde_json::from_value(value).unwrap_or_default();
        if !errors.is_empty() {
            return Err(HarnessError::Stream(errors.join("; ")));
        }
    }

    loop {
        let value = driver.execute_script(NEXT_JOB, vec![]).await?;
        match serde_json::from_value::<Option<PageJob>>(value) {
            Ok(Some(job)) => {
                debug!(id = job.id, job_type = %job.job_type, "job dequeued from page");
                let deferred = JobDeferred::new(job.id, ack_tx.clone());
                if events.send(JobEvent::Next { job, deferred }).is_err() {
                    // Consumer is gone; nothing left to deliver to.
                    return Ok(Poll::Complete);
                }
            }
            Ok(None) => break,
            Err(err) => {
                return Err(HarnessError::Stream(format!("malformed job from page: {err}")));
            }
        }
    }

    let done = driver.execute_script(STREAM_DONE, vec![]).await?;
    if done.as_bool().unwrap_or(false) {
        debug!("page reports done; completing job stream");
        let _ = events.send(JobEvent::Complete);
        return Ok(Poll::Complete);
    }
    Ok(Poll::Continue)
}

async fn relay_ack<D: PageDriver>(driver: &D, ack: &JobAck) -> Result<(), WebDriverError> {
    match &ack.error {
        None => {
            driver.execute_script(RESOLVE_JOB, vec![json!(ack.id)]).await?;
        }
        Some(reason) => {
            driver
                .execute_script(REJECT_JOB, vec![json!(ack.id), json!(reason)])
                .await?;
        }
    }
    Ok(())
}
