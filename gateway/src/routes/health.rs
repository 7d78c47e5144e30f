//! Liveness/readiness (spec §4.8, §6 `GET /health`). Exempt from admission.

use crate::state::State;
use actix_web::{get, web, HttpResponse};
use serde::Serialize;

/// Per-queue health, as seen from the gateway's side (spec §4.8): a queue
/// with zero jobs ever seen is `waiting`, not an error.
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum QueueState {
    Healthy,
    Waiting,
    Unreachable,
}

#[derive(Debug, Serialize)]
struct QueueHealth {
    queue: &'static str,
    state: QueueState,
    depth: Option<i64>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    broker_reachable: bool,
    queues: Vec<QueueHealth>,
}

const KNOWN_QUEUES: &[&str] = &[
    "ifcconvert",
    "ifccsv",
    "ifcclash",
    "ifctester",
    "ifcdiff",
    "ifc5d",
    "ifc2json",
    "ifcpatch",
];

#[get("/health")]
pub async fn health(state: web::Data<State>) -> HttpResponse {
    let mut broker_reachable = false;
    let mut queues = Vec::with_capacity(KNOWN_QUEUES.len());

    for &queue in KNOWN_QUEUES {
        match state.broker.queue_depth(queue).await {
            Ok(depth) => {
                broker_reachable = true;
                crate::metrics::set_queue_depth(queue, depth);
                let state = if depth == 0 {
                    QueueState::Waiting
                } else {
                    QueueState::Healthy
                };
                queues.push(QueueHealth {
                    queue,
                    state,
                    depth: Some(depth),
                });
            }
            Err(_) => queues.push(QueueHealth {
                queue,
                state: QueueState::Unreachable,
                depth: None,
            }),
        }
    }

    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        broker_reachable,
        queues,
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health).route(
        "/metrics",
        web::get().to(commons::metrics::serve::<crate::metrics::RegistryWrapper>),
    );
}
