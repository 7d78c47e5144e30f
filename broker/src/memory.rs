//! An in-process, in-memory [`BrokerClient`] used by gateway and worker
//! unit tests so they do not require a live Redis instance.

use crate::client::BrokerClient;
use crate::job::{Job, JobRecord, JobStatus, NewJob};
use async_trait::async_trait;
use chrono::Utc;
use commons::JobError;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    queues: HashMap<String, VecDeque<Uuid>>,
    jobs: HashMap<Uuid, Job>,
}

/// A FIFO-per-queue, hash-of-jobs broker held entirely in process memory.
pub struct InMemoryBroker {
    inner: Mutex<Inner>,
    notify: Notify,
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        InMemoryBroker {
            inner: Mutex::new(Inner::default()),
            notify: Notify::new(),
        }
    }
}

impl InMemoryBroker {
    /// Build an empty broker.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BrokerClient for InMemoryBroker {
    async fn enqueue(&self, new_job: NewJob) -> anyhow::Result<Uuid> {
        let id = Uuid::new_v4();
        let job = Job {
            id,
            queue: new_job.queue.clone(),
            handler_name: new_job.handler_name,
            payload: new_job.payload,
            status: JobStatus::Queued,
            timeout_secs: new_job.timeout_secs,
            enqueued_at: Utc::now(),
            started_at: None,
            ended_at: None,
            result: None,
            error: None,
        };

        let mut inner = self.inner.lock().unwrap();
        inner.jobs.insert(id, job);
        inner.queues.entry(new_job.queue).or_default().push_back(id);
        drop(inner);
        self.notify.notify_waiters();
        Ok(id)
    }

    async fn block_pop(&self, queue: &str, max_wait: Duration) -> anyhow::Result<Option<Job>> {
        let deadline = Instant::now() + max_wait;
        loop {
            {
                let mut inner = self.inner.lock().unwrap();
                if let Some(id) = inner.queues.get_mut(queue).and_then(VecDeque::pop_front) {
                    return Ok(inner.jobs.get(&id).cloned());
                }
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }

            let notified = self.notify.notified();
            tokio::select! {
                _ = notified => continue,
                _ = tokio::time::sleep(remaining) => return Ok(None),
            }
        }
    }

    async fn set_status(&self, id: Uuid, status: JobStatus) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(job) = inner.jobs.get_mut(&id) {
            if job.status.is_terminal() {
                return Ok(());
            }
            job.status = status;
            if status == JobStatus::Started {
                job.started_at = Some(Utc::now());
            }
        }
        Ok(())
    }

    async fn complete(&self, id: Uuid, result: serde_json::Value) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(job) = inner.jobs.get_mut(&id) {
            if job.status.is_terminal() {
                return Ok(());
            }
            job.status = JobStatus::Finished;
            job.result = Some(result);
            job.ended_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn fail(&self, id: Uuid, status: JobStatus, error: JobError) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(job) = inner.jobs.get_mut(&id) {
            if job.status.is_terminal() {
                return Ok(());
            }
            job.status = status;
            job.error = Some(error);
            job.ended_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<JobRecord> {
        let inner = self.inner.lock().unwrap();
        Ok(match inner.jobs.get(&id) {
            Some(job) => JobRecord::Known(Box::new(job.clone())),
            None => JobRecord::Unknown(id),
        })
    }

    async fn queue_depth(&self, queue: &str) -> anyhow::Result<i64> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .queues
            .get(queue)
            .map(|q| q.len() as i64)
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commons::ErrorKind;

    fn sample_job(queue: &str) -> NewJob {
        NewJob {
            queue: queue.to_string(),
            handler_name: "tasks.run_ifcconvert".to_string(),
            payload: serde_json::json!({"input_filename": "a.ifc"}),
            timeout_secs: 60,
        }
    }

    #[tokio::test]
    async fn fifo_under_single_producer() {
        let broker = InMemoryBroker::new();
        let a = broker.enqueue(sample_job("ifcconvert")).await.unwrap();
        let b = broker.enqueue(sample_job("ifcconvert")).await.unwrap();
        let c = broker.enqueue(sample_job("ifcconvert")).await.unwrap();

        let popped_a = broker
            .block_pop("ifcconvert", Duration::from_millis(50))
            .await
            .unwrap()
            .unwrap();
        let popped_b = broker
            .block_pop("ifcconvert", Duration::from_millis(50))
            .await
            .unwrap()
            .unwrap();
        let popped_c = broker
            .block_pop("ifcconvert", Duration::from_millis(50))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(popped_a.id, a);
        assert_eq!(popped_b.id, b);
        assert_eq!(popped_c.id, c);
    }

    #[tokio::test]
    async fn block_pop_times_out_on_empty_queue() {
        let broker = InMemoryBroker::new();
        let popped = broker
            .block_pop("ifcclash", Duration::from_millis(20))
            .await
            .unwrap();
        assert!(popped.is_none());
    }

    #[tokio::test]
    async fn terminal_status_is_immutable() {
        let broker = InMemoryBroker::new();
        let id = broker.enqueue(sample_job("ifcconvert")).await.unwrap();

        broker
            .complete(id, serde_json::json!({"success": true}))
            .await
            .unwrap();
        broker
            .fail(
                id,
                JobStatus::Failed,
                JobError::new(ErrorKind::Handler, "too late"),
            )
            .await
            .unwrap();

        let record = broker.get(id).await.unwrap();
        match record {
            JobRecord::Known(job) => {
                assert_eq!(job.status, JobStatus::Finished);
                assert!(job.error.is_none());
            }
            JobRecord::Unknown(_) => panic!("expected a known job"),
        }
    }

    #[tokio::test]
    async fn unknown_id_reports_unknown() {
        let broker = InMemoryBroker::new();
        let record = broker.get(Uuid::new_v4()).await.unwrap();
        assert!(matches!(record, JobRecord::Unknown(_)));
    }
}
