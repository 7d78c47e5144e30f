//! Generic job status endpoint (spec §4.5, §6 `GET /jobs/{id}/status`).

use crate::admission::Admitted;
use crate::state::State;
use actix_web::{get, web, HttpResponse};
use broker::{JobRecord, JobStatus};
use commons::{ErrorKind, JobError};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JobError>,
    enqueued_at: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    started_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ended_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[get("/jobs/{id}/status")]
pub async fn status(
    _admitted: Admitted,
    state: web::Data<State>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, JobError> {
    let id = path.into_inner();

    let record = state
        .broker
        .get(id)
        .await
        .map_err(|e| JobError::new(ErrorKind::Broker, e.to_string()))?;

    match record {
        JobRecord::Unknown(_) => Err(JobError::new(ErrorKind::NotFound, "unknown job id")),
        JobRecord::Known(job) => Ok(HttpResponse::Ok().json(StatusResponse {
            status: job.status,
            result: job.result,
            error: job.error,
            enqueued_at: job.enqueued_at,
            started_at: job.started_at,
            ended_at: job.ended_at,
        })),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(status);
}
