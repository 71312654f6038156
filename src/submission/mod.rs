//! Submission backend contract and the payload handed to it.

mod progress;

pub use progress::{Milestone, ProgressPlan, ProgressStage};

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::SubmissionError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionMetadata {
    pub submission_id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    /// Milliseconds between form start and submission.
    pub elapsed_ms: u64,
}

/// Everything the backend receives: the collected field values plus metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub fields: BTreeMap<String, String>,
    pub metadata: SubmissionMetadata,
}

/// Backend acknowledgement of an accepted lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub reference: String,
    pub received_at: DateTime<Utc>,
}

#[async_trait]
pub trait SubmissionBackend: Send + Sync {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<Ack, SubmissionError>;
}

/// Stand-in backend with a fixed latency. The first `failures` calls are
/// rejected, which lets callers exercise the retry path.
#[derive(Debug)]
pub struct SimulatedBackend {
    latency: Duration,
    failures_remaining: AtomicU32,
    calls: AtomicUsize,
}

impl SimulatedBackend {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            failures_remaining: AtomicU32::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn failing_first(mut self, failures: u32) -> Self {
        self.failures_remaining = AtomicU32::new(failures);
        self
    }

    /// Number of payloads received so far, accepted or not.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubmissionBackend for SimulatedBackend {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<Ack, SubmissionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let should_fail = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if should_fail {
            tracing::debug!(submission_id = %payload.metadata.submission_id, "simulated rejection");
            return Err(SubmissionError::new("quote service unavailable"));
        }

        tracing::debug!(
            submission_id = %payload.metadata.submission_id,
            fields = payload.fields.len(),
            "simulated acknowledgement"
        );
        Ok(Ack {
            reference: format!("Q-{}", &payload.metadata.submission_id.simple().to_string()[..8]),
            received_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> SubmissionPayload {
        let now = Utc::now();
        SubmissionPayload {
            fields: BTreeMap::from([("zipcode".to_string(), "12345".to_string())]),
            metadata: SubmissionMetadata {
                submission_id: Uuid::new_v4(),
                submitted_at: now,
                started_at: now,
                elapsed_ms: 0,
            },
        }
    }

    #[tokio::test]
    async fn simulated_backend_fails_then_recovers() {
        let backend = SimulatedBackend::instant().failing_first(1);
        let payload = payload();

        assert!(backend.submit(&payload).await.is_err());
        let ack = backend.submit(&payload).await.unwrap();

        assert!(ack.reference.starts_with("Q-"));
        assert_eq!(ack.reference.len(), 10);
        assert_eq!(backend.calls(), 2);
    }

    #[test]
    fn payload_serializes_fields_and_metadata() {
        let json = serde_json::to_value(payload()).unwrap();
        assert_eq!(json["fields"]["zipcode"], "12345");
        assert!(json["metadata"]["submitted_at"].is_string());
        assert_eq!(json["metadata"]["elapsed_ms"], 0);
    }
}
