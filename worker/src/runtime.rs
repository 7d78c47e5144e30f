//! The worker runtime (spec C3, §4.3, §5): one process bound to exactly
//! one queue, popping jobs strictly sequentially and enforcing a per-job
//! timeout with a watchdog that may only observe and abort, never mutate
//! handler-visible state.

use crate::handlers::HandlerContext;
use crate::registry;
use broker::{BrokerClient, JobStatus};
use commons::{ErrorKind, JobError};
use log::{error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Bounded wait passed to `block_pop` so a shutdown signal is observable
/// between pops (spec §4.3: "implementation chooses, e.g. 5s").
const BLOCK_POP_WAIT: Duration = Duration::from_secs(5);

/// The runtime's single responsibility: run until told to stop, processing
/// one job at a time off `queue`.
pub struct Runtime {
    broker: Arc<dyn BrokerClient>,
    queue: String,
    ctx: HandlerContext,
}

impl Runtime {
    pub fn new(broker: Arc<dyn BrokerClient>, queue: String, ctx: HandlerContext) -> Self {
        Runtime { broker, queue, ctx }
    }

    /// Run the block-pop / decode / dispatch / publish loop until
    /// `shutdown` is observed. Never returns early on a transient broker
    /// error — it retries with bounded backoff (spec §7 `broker` kind)
    /// and keeps serving the queue.
    pub async fn run(&self, shutdown: Arc<AtomicBool>) {
        let mut backoff = broker::backoff::Backoff::default_broker_policy();

        while !shutdown.load(Ordering::Relaxed) {
            match self.broker.block_pop(&self.queue, BLOCK_POP_WAIT).await {
                Ok(Some(job)) => {
                    backoff.reset();
                    info!("job {} popped from {}", job.id, self.queue);
                    self.process(job).await;
                    if let Ok(depth) = self.broker.queue_depth(&self.queue).await {
                        crate::metrics::set_queue_depth(depth);
                    }
                }
                Ok(None) => {
                    // Idle tick; loop back to check `shutdown` and re-poll.
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    warn!("broker error on queue {}: {} (retrying in {:?})", self.queue, e, delay);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn process(&self, job: broker::Job) {
        let id = job.id;

        if let Err(e) = self.broker.set_status(id, JobStatus::Started).await {
            error!("job {} failed to mark started: {}", id, e);
            return;
        }
        info!("job {} started, handler={}", id, job.handler_name);

        let handler = match registry::resolve(&job.handler_name) {
            Ok(handler) => handler,
            Err(err) => {
                self.publish_failure(id, err).await;
                return;
            }
        };

        let timeout = Duration::from_secs(job.timeout_secs);
        let ctx = self.ctx.clone();
        let payload = job.payload.clone();

        match tokio::time::timeout(timeout, handler(payload, ctx)).await {
            Ok(Ok(result)) => {
                info!("job {} finished", id);
                crate::metrics::record_outcome("finished");
                if let Err(e) = self.broker.complete(id, result).await {
                    error!("job {} failed to publish completion: {}", id, e);
                }
            }
            Ok(Err(err)) => {
                info!("job {} failed: {}", id, err.message);
                crate::metrics::record_outcome("failed");
                self.publish_failure(id, err).await;
            }
            Err(_elapsed) => {
                // The handler future is dropped here; it may have been
                // mid-write, so any partial output is left for the next
                // cleanup sweep rather than trusted (spec §4.3, §5).
                warn!("job {} timed out after {:?}", id, timeout);
                crate::metrics::record_outcome("timed_out");
                if let Err(e) = self
                    .broker
                    .fail(
                        id,
                        JobStatus::TimedOut,
                        JobError::new(ErrorKind::Timeout, "job exceeded its declared timeout"),
                    )
                    .await
                {
                    error!("job {} failed to publish timeout: {}", id, e);
                }
            }
        }
    }

    async fn publish_failure(&self, id: Uuid, err: JobError) {
        if let Err(e) = self.broker.fail(id, JobStatus::Failed, err).await {
            error!("job {} failed to publish failure: {}", id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broker::memory::InMemoryBroker;
    use broker::{JobRecord, NewJob};

    #[tokio::test]
    async fn processes_one_job_then_observes_shutdown() {
        let uploads = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        tokio::fs::write(uploads.path().join("a.ifc"), b"dummy")
            .await
            .unwrap();

        let broker: Arc<dyn BrokerClient> = Arc::new(InMemoryBroker::new());
        let id = broker
            .enqueue(NewJob {
                queue: "ifc2json".to_string(),
                handler_name: "tasks.run_ifc2json".to_string(),
                payload: serde_json::json!({"filename": "a.ifc", "output_filename": "a.json"}),
                timeout_secs: 5,
            })
            .await
            .unwrap();

        let ctx = HandlerContext {
            uploads_root: uploads.path().to_path_buf(),
            output_root: output.path().to_path_buf(),
        };
        let runtime = Runtime::new(broker.clone(), "ifc2json".to_string(), ctx);
        let shutdown = Arc::new(AtomicBool::new(false));

        let shutdown_for_run = shutdown.clone();
        let handle = tokio::spawn(async move { runtime.run(shutdown_for_run).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.store(true, Ordering::Relaxed);
        tokio::time::timeout(Duration::from_secs(6), handle)
            .await
            .expect("runtime did not observe shutdown in time")
            .unwrap();

        match broker.get(id).await.unwrap() {
            JobRecord::Known(job) => assert_eq!(job.status, JobStatus::Finished),
            JobRecord::Unknown(_) => panic!("expected a known job"),
        }
        assert!(output.path().join("a.json").exists());
    }

    #[tokio::test]
    async fn unknown_handler_is_published_as_failed() {
        let uploads = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();

        let broker: Arc<dyn BrokerClient> = Arc::new(InMemoryBroker::new());
        let id = broker
            .enqueue(NewJob {
                queue: "ifc2json".to_string(),
                handler_name: "tasks.nonexistent".to_string(),
                payload: serde_json::json!({}),
                timeout_secs: 5,
            })
            .await
            .unwrap();

        let ctx = HandlerContext {
            uploads_root: uploads.path().to_path_buf(),
            output_root: output.path().to_path_buf(),
        };
        let runtime = Runtime::new(broker.clone(), "ifc2json".to_string(), ctx);
        let shutdown = Arc::new(AtomicBool::new(false));

        let shutdown_for_run = shutdown.clone();
        let handle = tokio::spawn(async move { runtime.run(shutdown_for_run).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.store(true, Ordering::Relaxed);
        tokio::time::timeout(Duration::from_secs(6), handle)
            .await
            .expect("runtime did not observe shutdown in time")
            .unwrap();

        match broker.get(id).await.unwrap() {
            JobRecord::Known(job) => assert_eq!(job.status, JobStatus::Failed),
            JobRecord::Unknown(_) => panic!("expected a known job"),
        }
    }
}
