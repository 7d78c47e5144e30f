//! The production [`BrokerClient`] implementation, backed by a
//! Redis-compatible store (spec §1: "a Redis-compatible store with list
//! and hash primitives and pub/sub-style blocking pop").
//!
//! Key layout (spec §6):
//!   * list `queue:<name>` — job ids awaiting processing.
//!   * hash `job:<id>` — `queue`, `handler`, `payload`, `status`, `timeout`,
//!     `enqueued_at`, `started_at`, `ended_at`, `result`, `error`.

use crate::client::BrokerClient;
use crate::job::{Job, JobRecord, JobStatus, NewJob};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use commons::JobError;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

/// Lua script that transitions a job's status only if it has not already
/// reached a terminal one, updating an arbitrary set of accompanying
/// fields in the same atomic step (spec §8 invariant I3).
static TRANSITION_SCRIPT: &str = r#"
local key = KEYS[1]
local current = redis.call('HGET', key, 'status')
if not current then
  return 0
end
if current == 'finished' or current == 'failed' or current == 'timed_out' then
  return 0
end
for i = 1, #ARGV, 2 do
  redis.call('HSET', key, ARGV[i], ARGV[i + 1])
end
return 1
"#;

/// `RedisBroker` talks to a Redis-compatible store over a
/// [`ConnectionManager`], which transparently reconnects on transport
/// errors; broker-level retry/backoff on top of that lives in the worker
/// runtime (spec §7 `broker` error kind).
pub struct RedisBroker {
    conn: ConnectionManager,
    transition: Script,
    result_ttl: Duration,
}

fn queue_key(queue: &str) -> String {
    format!("queue:{}", queue)
}

fn job_key(id: Uuid) -> String {
    format!("job:{}", id)
}

fn to_rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

fn from_rfc3339(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

impl RedisBroker {
    /// Connect to `redis_url` (e.g. `redis://127.0.0.1:6379`). Terminal
    /// job records are kept for `result_ttl` after completion (spec §6,
    /// `JOB_RESULT_TTL_SECONDS`).
    pub async fn connect(redis_url: &str, result_ttl: Duration) -> anyhow::Result<Self> {
        let client = Client::open(redis_url)?;
        let conn = client.get_connection_manager().await?;
        Ok(RedisBroker {
            conn,
            transition: Script::new(TRANSITION_SCRIPT),
            result_ttl,
        })
    }

    async fn apply_transition(
        &self,
        id: Uuid,
        fields: &[(&str, String)],
    ) -> anyhow::Result<bool> {
        let mut args: Vec<String> = Vec::with_capacity(fields.len() * 2);
        for (k, v) in fields {
            args.push((*k).to_string());
            args.push(v.clone());
        }

        let mut conn = self.conn.clone();
        let mut invocation = self.transition.key(job_key(id));
        for arg in &args {
            invocation = invocation.arg(arg);
        }
        let applied: i64 = invocation.invoke_async(&mut conn).await?;
        Ok(applied == 1)
    }

    async fn expire_job(&self, id: Uuid) -> anyhow::Result<()> {
        if self.result_ttl.is_zero() {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        let _: () = conn
            .expire(job_key(id), self.result_ttl.as_secs() as i64)
            .await?;
        Ok(())
    }

    fn job_from_hash(id: Uuid, fields: HashMap<String, String>) -> anyhow::Result<Job> {
        let get = |k: &str| fields.get(k).cloned();
        let status = match get("status").as_deref() {
            Some("queued") => JobStatus::Queued,
            Some("started") => JobStatus::Started,
            Some("finished") => JobStatus::Finished,
            Some("failed") => JobStatus::Failed,
            Some("timed_out") => JobStatus::TimedOut,
            other => anyhow::bail!("job {} has unrecognized status {:?}", id, other),
        };

        Ok(Job {
            id,
            queue: get("queue").unwrap_or_default(),
            handler_name: get("handler").unwrap_or_default(),
            payload: get("payload")
                .map(|raw| serde_json::from_str(&raw))
                .transpose()?
                .unwrap_or(serde_json::Value::Null),
            status,
            timeout_secs: get("timeout").and_then(|t| t.parse().ok()).unwrap_or(0),
            enqueued_at: get("enqueued_at")
                .map(|raw| from_rfc3339(&raw))
                .transpose()?
                .unwrap_or_else(Utc::now),
            started_at: get("started_at")
                .filter(|s| !s.is_empty())
                .map(|raw| from_rfc3339(&raw))
                .transpose()?,
            ended_at: get("ended_at")
                .filter(|s| !s.is_empty())
                .map(|raw| from_rfc3339(&raw))
                .transpose()?,
            result: get("result")
                .filter(|s| !s.is_empty())
                .map(|raw| serde_json::from_str(&raw))
                .transpose()?,
            error: get("error")
                .filter(|s| !s.is_empty())
                .map(|raw| serde_json::from_str::<JobError>(&raw))
                .transpose()?,
        })
    }
}

#[async_trait]
impl BrokerClient for RedisBroker {
    async fn enqueue(&self, new_job: NewJob) -> anyhow::Result<Uuid> {
        let id = Uuid::new_v4();
        let enqueued_at = Utc::now();
        let payload = serde_json::to_string(&new_job.payload)?;

        let mut conn = self.conn.clone();
        redis::pipe()
            .atomic()
            .hset_multiple(
                job_key(id),
                &[
                    ("queue", new_job.queue.as_str()),
                    ("handler", new_job.handler_name.as_str()),
                    ("payload", payload.as_str()),
                    ("status", "queued"),
                    ("timeout", &new_job.timeout_secs.to_string()),
                    ("enqueued_at", &to_rfc3339(enqueued_at)),
                ],
            )
            .ignore()
            .rpush(queue_key(&new_job.queue), id.to_string())
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(id)
    }

    async fn block_pop(&self, queue: &str, max_wait: Duration) -> anyhow::Result<Option<Job>> {
        let mut conn = self.conn.clone();
        let popped: Option<(String, String)> = conn
            .blpop(queue_key(queue), max_wait.as_secs_f64())
            .await?;

        let Some((_key, id_raw)) = popped else {
            return Ok(None);
        };
        let id = Uuid::parse_str(&id_raw)?;

        let fields: HashMap<String, String> = conn.hgetall(job_key(id)).await?;
        if fields.is_empty() {
            // The hash was reaped between the pop and the read; treat the
            // pop as a miss rather than fabricating a record.
            return Ok(None);
        }

        Ok(Some(Self::job_from_hash(id, fields)?))
    }

    async fn set_status(&self, id: Uuid, status: JobStatus) -> anyhow::Result<()> {
        let status_str = match status {
            JobStatus::Queued => "queued",
            JobStatus::Started => "started",
            JobStatus::Finished => "finished",
            JobStatus::Failed => "failed",
            JobStatus::TimedOut => "timed_out",
        };
        let mut fields = vec![("status", status_str.to_string())];
        if status == JobStatus::Started {
            fields.push(("started_at", to_rfc3339(Utc::now())));
        }
        self.apply_transition(id, &fields).await?;
        Ok(())
    }

    async fn complete(&self, id: Uuid, result: serde_json::Value) -> anyhow::Result<()> {
        let applied = self
            .apply_transition(
                id,
                &[
                    ("status", "finished".to_string()),
                    ("result", serde_json::to_string(&result)?),
                    ("ended_at", to_rfc3339(Utc::now())),
                ],
            )
            .await?;
        if applied {
            self.expire_job(id).await?;
        }
        Ok(())
    }

    async fn fail(&self, id: Uuid, status: JobStatus, error: JobError) -> anyhow::Result<()> {
        let status_str = match status {
            JobStatus::Failed => "failed",
            JobStatus::TimedOut => "timed_out",
            other => anyhow::bail!("fail() called with non-terminal-failure status {:?}", other),
        };
        let applied = self
            .apply_transition(
                id,
                &[
                    ("status", status_str.to_string()),
                    ("error", serde_json::to_string(&error)?),
                    ("ended_at", to_rfc3339(Utc::now())),
                ],
            )
            .await?;
        if applied {
            self.expire_job(id).await?;
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<JobRecord> {
        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> = conn.hgetall(job_key(id)).await?;
        if fields.is_empty() {
            return Ok(JobRecord::Unknown(id));
        }
        Ok(JobRecord::Known(Box::new(Self::job_from_hash(id, fields)?)))
    }

    async fn queue_depth(&self, queue: &str) -> anyhow::Result<i64> {
        let mut conn = self.conn.clone();
        let depth: i64 = conn.llen(queue_key(queue)).await?;
        Ok(depth)
    }
}
