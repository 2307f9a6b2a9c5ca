use serde::Deserialize;
use tokio::sync::mpsc::UnboundedSender;

/// Job type the runner knows how to handle.
pub const SNAPSHOT: &str = "snapshot";

/// A unit of test work dequeued from the page-side harness.
#[derive(Debug, Clone, Deserialize)]
pub struct PageJob {
    /// Page-assigned identifier, echoed back in the acknowledgment.
    pub id: u64,
    /// Discriminant; only [`SNAPSHOT`] is recognized.
    #[serde(rename = "type")]
    pub job_type: String,
}

/// Acknowledgment sent back through the stream to the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobAck {
    pub id: u64,
    /// `None` for success, `Some(reason)` for a rejected job.
    pub error: Option<String>,
}

/// Per-job completion handle.
///
/// Consuming `resolve`/`reject` makes double acknowledgment unrepresentable.
/// Dropping the handle without acknowledging leaves the job unacknowledged on
/// the page, which only happens when the run is being torn down anyway.
#[derive(Debug)]
pub struct JobDeferred {
    id: u64,
    ack_tx: UnboundedSender<JobAck>,
}

impl JobDeferred {
    pub(crate) fn new(id: u64, ack_tx: UnboundedSender<JobAck>) -> Self {
        Self { id, ack_tx }
    }

    /// Acknowledge the job as processed successfully.
    pub fn resolve(self) {
        let _ = self.ack_tx.send(JobAck {
            id: self.id,
            error: None,
        });
    }

    /// Acknowledge the job as failed, with a reason for the page harness.
    pub fn reject(self, reason: impl Into<String>) {
        let _ = self.ack_tx.send(JobAck {
            id: self.id,
            error: Some(reason.into()),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn page_job_deserializes_from_harness_shape() {
        let job: PageJob = serde_json::from_str(r#"{ "id": 3, "type": "snapshot" }"#).unwrap();
        assert_eq!(job.id, 3);
        assert_eq!(job.job_type, SNAPSHOT);
    }

    #[test]
    fn resolve_sends_success_ack() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        JobDeferred::new(1, tx).resolve();
        assert_eq!(
            rx.try_recv().unwrap(),
            JobAck {
                id: 1,
                error: None
            }
        );
    }

    #[test]
    fn reject_sends_reason() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        JobDeferred::new(2, tx).reject("snapshot mismatch");
        assert_eq!(
            rx.try_recv().unwrap(),
            JobAck {
                id: 2,
                error: Some("snapshot mismatch".into())
            }
        );
    }

    #[test]
    fn dropping_without_ack_sends_nothing() {
        let (tx, mut rx) = mpsc::unbounded_channel::<JobAck>();
        drop(JobDeferred::new(4, tx));
        assert!(rx.try_recv().is_err());
    }
}
