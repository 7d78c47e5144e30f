//! Synchronous recipe listing (spec §4.5, §5, §6 `POST /patch/recipes/list`).
//!
//! Unlike every other enqueue endpoint, this one enqueues a job onto the
//! patch worker's queue and then polls the broker for its result within a
//! small bounded wait budget, returning the result inline instead of a
//! bare job id (spec S6).

use crate::admission::Admitted;
use crate::kinds::{Kind, PatchListRequest};
use crate::state::State;
use actix_web::{post, web, HttpResponse};
use broker::{codec, JobRecord, JobStatus, NewJob};
use commons::{ErrorKind, JobError};
use std::time::Instant;
use tokio::time::{sleep, Duration};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[post("/patch/recipes/list")]
pub async fn recipes_list(
    _admitted: Admitted,
    state: web::Data<State>,
    body: web::Json<PatchListRequest>,
) -> Result<HttpResponse, JobError> {
    let encoded = codec::encode(&body.into_inner())?;
    let job_id = state
        .broker
        .enqueue(NewJob {
            queue: Kind::PatchList.queue().to_string(),
            handler_name: Kind::PatchList.handler_name().to_string(),
            payload: encoded,
            timeout_secs: Kind::PatchList.default_timeout().as_secs(),
        })
        .await
        .map_err(|e| JobError::new(ErrorKind::Broker, e.to_string()))?;

    let deadline = Instant::now() + state.settings.patch_list_wait;
    loop {
        let record = state
            .broker
            .get(job_id)
            .await
            .map_err(|e| JobError::new(ErrorKind::Broker, e.to_string()))?;

        match record {
            JobRecord::Known(job) => match job.status {
                JobStatus::Finished => {
                    let result = job
                        .result
                        .ok_or_else(|| JobError::new(ErrorKind::Handler, "finished job has no result"))?;
                    return Ok(HttpResponse::Ok().json(result));
                }
                JobStatus::Failed | JobStatus::TimedOut => {
                    return Err(job
                        .error
                        .unwrap_or_else(|| JobError::new(ErrorKind::Handler, "patch worker failed")));
                }
                JobStatus::Queued | JobStatus::Started => {}
            },
            JobRecord::Unknown(_) => {
                return Err(JobError::new(ErrorKind::NotFound, "job reaped before it completed"))
            }
        }

        if Instant::now() >= deadline {
            // Spec §6 calls for a bare `408` here, distinct from the `504`
            // a `timeout`-kind `JobError` would otherwise produce.
            return Ok(HttpResponse::RequestTimeout().json(JobError::new(
                ErrorKind::Timeout,
                "patch worker did not answer within the wait budget",
            )));
        }
        sleep(POLL_INTERVAL).await;
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(recipes_list);
}
