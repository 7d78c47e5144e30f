//! Artifact token issuance and redemption (spec §4.6, §6).

use crate::admission::Admitted;
use crate::state::State;
use crate::token_store::RedeemError;
use actix_files::NamedFile;
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use chrono::Utc;
use commons::{ErrorKind, JobError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateLinkRequest {
    file_path: String,
}

#[derive(Debug, Serialize)]
struct CreateLinkResponse {
    token: String,
    expires_at: chrono::DateTime<Utc>,
}

/// `POST /create_download_link` (spec §4.6, §6). `file_path` is a bare
/// filename under one of the output roots, never a client-chosen absolute
/// path — see [`commons::paths::sanitize_under`].
#[post("/create_download_link")]
pub async fn create_download_link(
    _admitted: Admitted,
    state: web::Data<State>,
    body: web::Json<CreateLinkRequest>,
) -> Result<HttpResponse, JobError> {
    let resolved = commons::paths::sanitize_under(&state.settings.output_root, &body.file_path)?;
    let (token, expires_at) = state.tokens.mint(resolved, Utc::now());
    Ok(HttpResponse::Ok().json(CreateLinkResponse { token, expires_at }))
}

/// `GET /download/{token}` (spec §4.6, §6, §8 invariant I5). Accepts only
/// tokens minted by this service; `404` and `410` are returned for the
/// same reasons without disclosing which applies, beyond the status code
/// itself (spec §4.6: "rejects forgeries without disclosing which failure
/// occurred").
#[get("/download/{token}")]
pub async fn download(
    req: HttpRequest,
    _admitted: Admitted,
    state: web::Data<State>,
    path: web::Path<String>,
) -> Result<HttpResponse, JobError> {
    let token = path.into_inner();
    let resolved = match state.tokens.redeem(&token, Utc::now()) {
        Ok(path) => path,
        // `404` for an unknown/forged token, `410` once it has expired
        // (spec §6); both bodies are equally non-descriptive.
        Err(RedeemError::Unknown) => {
            return Ok(HttpResponse::NotFound().json(JobError::new(
                ErrorKind::NotFound,
                "unknown download token",
            )))
        }
        Err(RedeemError::Expired) => {
            return Ok(HttpResponse::Gone().json(JobError::new(
                ErrorKind::NotFound,
                "download token expired",
            )))
        }
    };

    let file = NamedFile::open_async(&resolved)
        .await
        .map_err(|e| JobError::new(ErrorKind::NotFound, e.to_string()))?;

    Ok(file.into_response(&req))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_download_link).service(download);
}
