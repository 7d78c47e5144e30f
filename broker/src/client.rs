//! The broker client surface (spec §4.1).

use crate::job::{Job, JobRecord, JobStatus, NewJob};
use async_trait::async_trait;
use commons::JobError;
use std::time::Duration;
use uuid::Uuid;

/// Typed read/write access to queues, job hashes, and result keys on the
/// shared broker.
///
/// Implementations must provide FIFO ordering within a queue under a
/// single producer, and must never lose a monotone insertion under
/// concurrent producers (spec §4.1 "Ordering guarantees").
#[async_trait]
pub trait BrokerClient: Send + Sync {
    /// Write the job record and append its id to `new_job.queue`,
    /// atomically with respect to concurrent enqueues on the same queue.
    /// Returns the assigned job id.
    async fn enqueue(&self, new_job: NewJob) -> anyhow::Result<Uuid>;

    /// Remove the next id from `queue` (blocking up to `max_wait`), read
    /// its record, and return it. If two workers race for the same id,
    /// exactly one succeeds; the other observes an empty pop.
    async fn block_pop(&self, queue: &str, max_wait: Duration) -> anyhow::Result<Option<Job>>;

    /// Atomically transition a job to `status`. Silently a no-op if the
    /// job has already reached a terminal status.
    async fn set_status(&self, id: Uuid, status: JobStatus) -> anyhow::Result<()>;

    /// Atomically mark the job `Finished` with the given result. A no-op
    /// if the job is already terminal.
    async fn complete(&self, id: Uuid, result: serde_json::Value) -> anyhow::Result<()>;

    /// Atomically mark the job `Failed` or `TimedOut` with the given
    /// error. A no-op if the job is already terminal.
    async fn fail(&self, id: Uuid, status: JobStatus, error: JobError) -> anyhow::Result<()>;

    /// Idempotent read of a job record.
    async fn get(&self, id: Uuid) -> anyhow::Result<JobRecord>;

    /// Approximate count of ids currently queued under `queue`.
    async fn queue_depth(&self, queue: &str) -> anyhow::Result<i64>;
}
