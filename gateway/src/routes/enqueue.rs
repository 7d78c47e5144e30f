//! Per-kind enqueue endpoints (spec §4.5, §6).
//!
//! Every endpoint follows the same five steps: admit, validate, assign a
//! timeout, encode, enqueue. The per-kind schemas live in [`crate::kinds`];
//! this module only wires them to the broker.

use crate::admission::Admitted;
use crate::kinds::{
    ClashRequest, ConvertRequest, CsvExportRequest, CsvImportRequest, DiffRequest, JsonRequest,
    Kind, PatchRequest, QtoRequest, TesterRequest,
};
use crate::state::State;
use actix_web::{post, web, HttpResponse};
use broker::{codec, NewJob};
use commons::{ErrorKind, JobError};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct EnqueueResponse {
    job_id: uuid::Uuid,
}

async fn enqueue<T: serde::Serialize>(
    state: &State,
    kind: Kind,
    payload: &T,
) -> Result<HttpResponse, JobError> {
    let encoded = codec::encode(payload)?;
    let job_id = state
        .broker
        .enqueue(NewJob {
            queue: kind.queue().to_string(),
            handler_name: kind.handler_name().to_string(),
            payload: encoded,
            timeout_secs: kind.default_timeout().as_secs(),
        })
        .await
        .map_err(|e| JobError::new(ErrorKind::Broker, e.to_string()))?;

    crate::metrics::record_enqueued(kind.queue());
    Ok(HttpResponse::Ok().json(EnqueueResponse { job_id }))
}

fn check_filename(root: &Path, filename: &str) -> Result<(), JobError> {
    commons::paths::sanitize_under(root, filename).map(|_| ())
}

#[post("/ifcconvert")]
pub async fn convert(
    _admitted: Admitted,
    state: web::Data<State>,
    body: web::Json<ConvertRequest>,
) -> Result<HttpResponse, JobError> {
    check_filename(&state.settings.uploads_root, &body.input_filename)?;
    enqueue(&state, Kind::Convert, &body.into_inner()).await
}

#[post("/ifccsv")]
pub async fn csv_export(
    _admitted: Admitted,
    state: web::Data<State>,
    body: web::Json<CsvExportRequest>,
) -> Result<HttpResponse, JobError> {
    check_filename(&state.settings.uploads_root, &body.filename)?;
    enqueue(&state, Kind::CsvExport, &body.into_inner()).await
}

#[post("/ifccsv/import")]
pub async fn csv_import(
    _admitted: Admitted,
    state: web::Data<State>,
    body: web::Json<CsvImportRequest>,
) -> Result<HttpResponse, JobError> {
    check_filename(&state.settings.uploads_root, &body.ifc_filename)?;
    check_filename(&state.settings.uploads_root, &body.csv_filename)?;
    enqueue(&state, Kind::CsvImport, &body.into_inner()).await
}

#[post("/ifcclash")]
pub async fn clash(
    _admitted: Admitted,
    state: web::Data<State>,
    body: web::Json<ClashRequest>,
) -> Result<HttpResponse, JobError> {
    for set in &body.clash_sets {
        for filename in &set.filenames {
            check_filename(&state.settings.uploads_root, filename)?;
        }
    }
    enqueue(&state, Kind::Clash, &body.into_inner()).await
}

#[post("/ifctester")]
pub async fn tester(
    _admitted: Admitted,
    state: web::Data<State>,
    body: web::Json<TesterRequest>,
) -> Result<HttpResponse, JobError> {
    check_filename(&state.settings.uploads_root, &body.ifc_filename)?;
    check_filename(&state.settings.uploads_root, &body.ids_filename)?;
    enqueue(&state, Kind::Tester, &body.into_inner()).await
}

#[post("/ifcdiff")]
pub async fn diff(
    _admitted: Admitted,
    state: web::Data<State>,
    body: web::Json<DiffRequest>,
) -> Result<HttpResponse, JobError> {
    check_filename(&state.settings.uploads_root, &body.old_file)?;
    check_filename(&state.settings.uploads_root, &body.new_file)?;
    enqueue(&state, Kind::Diff, &body.into_inner()).await
}

#[post("/ifc5d")]
pub async fn qto(
    _admitted: Admitted,
    state: web::Data<State>,
    body: web::Json<QtoRequest>,
) -> Result<HttpResponse, JobError> {
    check_filename(&state.settings.uploads_root, &body.filename)?;
    enqueue(&state, Kind::Qto, &body.into_inner()).await
}

/// `calculate-qtos` is kept as an alias of `/ifc5d` (spec §9 Open
/// Question, resolved in `SPEC_FULL.md`).
#[post("/calculate-qtos")]
pub async fn qto_alias(
    admitted: Admitted,
    state: web::Data<State>,
    body: web::Json<QtoRequest>,
) -> Result<HttpResponse, JobError> {
    qto(admitted, state, body).await
}

#[post("/ifc2json")]
pub async fn json(
    _admitted: Admitted,
    state: web::Data<State>,
    body: web::Json<JsonRequest>,
) -> Result<HttpResponse, JobError> {
    check_filename(&state.settings.uploads_root, &body.filename)?;
    enqueue(&state, Kind::Json, &body.into_inner()).await
}

#[post("/patch/execute")]
pub async fn patch_execute(
    _admitted: Admitted,
    state: web::Data<State>,
    body: web::Json<PatchRequest>,
) -> Result<HttpResponse, JobError> {
    check_filename(&state.settings.uploads_root, &body.input_file)?;
    enqueue(&state, Kind::Patch, &body.into_inner()).await
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(convert)
        .service(csv_export)
        .service(csv_import)
        .service(clash)
        .service(tester)
        .service(diff)
        .service(qto)
        .service(qto_alias)
        .service(json)
        .service(patch_execute);
}
