//! The job data model (spec §3).

use chrono::{DateTime, Utc};
use commons::JobError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a job. See spec §3 for the full state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Written to the broker and appended to its queue; not yet popped.
    Queued,
    /// Popped by a worker and currently running.
    Started,
    /// Completed successfully; `result` is populated.
    Finished,
    /// Terminated with an error; `error` is populated.
    Failed,
    /// Exceeded its declared timeout; terminal.
    TimedOut,
}

impl JobStatus {
    /// Once a job reaches a terminal status its outcome is immutable
    /// (spec §3 "Terminal status", §8 invariant I3).
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Finished | JobStatus::Failed | JobStatus::TimedOut
        )
    }
}

/// A fully materialized job record, as read back from the broker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    /// Opaque unique identifier, assigned at enqueue.
    pub id: Uuid,
    /// Symbolic queue name identifying the handler pool.
    pub queue: String,
    /// Dotted string resolved in the worker's handler registry.
    pub handler_name: String,
    /// Structured, kind-specific payload.
    pub payload: serde_json::Value,
    /// Current lifecycle status.
    pub status: JobStatus,
    /// Per-job maximum wall-clock duration, in seconds.
    pub timeout_secs: u64,
    /// When the job was written to the broker.
    pub enqueued_at: DateTime<Utc>,
    /// When a worker began processing the job, if it has started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal status, if it has.
    pub ended_at: Option<DateTime<Utc>>,
    /// Present iff `status == Finished`.
    pub result: Option<serde_json::Value>,
    /// Present iff `status` is `Failed` or `TimedOut`.
    pub error: Option<JobError>,
}

/// The outcome of a `get(id)` lookup: either a live record, or an
/// acknowledgement that the id is unknown (never enqueued, or reaped past
/// its retention window). Spec §3: "Returns `unknown` status if the record
/// has been reaped."
#[derive(Debug, Clone)]
pub enum JobRecord {
    /// The job is (or was) known to the broker.
    Known(Box<Job>),
    /// No record exists under this id.
    Unknown(Uuid),
}

/// The fields a gateway enqueue endpoint supplies when creating a job; the
/// broker assigns `id`, `enqueued_at`, and the initial `Queued` status.
#[derive(Debug, Clone)]
pub struct NewJob {
    /// Target queue name.
    pub queue: String,
    /// Handler name to resolve in the target worker's registry.
    pub handler_name: String,
    /// Kind-specific request payload, already encoded (spec §4.2).
    pub payload: serde_json::Value,
    /// Per-job timeout, in seconds.
    pub timeout_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Started.is_terminal());
        assert!(JobStatus::Finished.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::TimedOut.is_terminal());
    }

    #[test]
    fn status_serializes_snake_case() {
        let encoded = serde_json::to_string(&JobStatus::TimedOut).unwrap();
        assert_eq!(encoded, "\"timed_out\"");
    }
}
