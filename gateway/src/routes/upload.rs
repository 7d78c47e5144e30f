//! Client input delivery (spec §4.7, §6): direct multipart upload,
//! fetch-by-URL, and a directory listing of the shared roots.

use crate::admission::Admitted;
use crate::state::State;
use actix_multipart::Multipart;
use actix_web::{get, post, web, HttpResponse};
use commons::{ErrorKind, JobError};
use futures::{StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Serialize)]
struct UploadResponse {
    filename: String,
}

/// `POST /upload/{kind}` — stream a multipart file straight into
/// `/uploads`, named by the field's own content-disposition filename.
#[post("/upload/{kind}")]
pub async fn upload(
    _admitted: Admitted,
    state: web::Data<State>,
    mut payload: Multipart,
) -> Result<HttpResponse, JobError> {
    let mut saved: Option<String> = None;

    while let Some(field) = payload.try_next().await.map_err(|e| {
        JobError::new(ErrorKind::Validation, format!("malformed multipart body: {}", e))
    })? {
        let filename = field
            .content_disposition()
            .get_filename()
            .map(str::to_string)
            .ok_or_else(|| JobError::new(ErrorKind::Validation, "missing filename in upload"))?;

        let destination = commons::paths::sanitize_under(&state.settings.uploads_root, &filename)?;
        write_field(field, &destination).await?;
        saved = Some(filename);
    }

    let filename = saved.ok_or_else(|| JobError::new(ErrorKind::Validation, "empty upload"))?;
    Ok(HttpResponse::Ok().json(UploadResponse { filename }))
}

async fn write_field(
    mut field: actix_multipart::Field,
    destination: &std::path::Path,
) -> Result<(), JobError> {
    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))?;
    }

    let tmp = destination.with_extension("part");
    let mut file = tokio::fs::File::create(&tmp)
        .await
        .map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))?;

    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| JobError::new(ErrorKind::Validation, e.to_string()))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))?;
    }
    file.flush()
        .await
        .map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))?;

    tokio::fs::rename(&tmp, destination)
        .await
        .map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))?;
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DownloadFromUrlRequest {
    url: String,
    filename: String,
}

#[derive(Debug, Serialize)]
struct DownloadFromUrlResponse {
    filename: String,
}

/// `POST /download-from-url` — fetch a remote file into `/uploads` under a
/// client-chosen (and sanitized) name.
#[post("/download-from-url")]
pub async fn download_from_url(
    _admitted: Admitted,
    state: web::Data<State>,
    body: web::Json<DownloadFromUrlRequest>,
) -> Result<HttpResponse, JobError> {
    let destination =
        commons::paths::sanitize_under(&state.settings.uploads_root, &body.filename)?;

    let response = reqwest::get(&body.url)
        .await
        .map_err(|e| JobError::new(ErrorKind::Handler, format!("fetch failed: {}", e)))?;
    if !response.status().is_success() {
        return Err(JobError::new(
            ErrorKind::Handler,
            format!("upstream returned {}", response.status()),
        ));
    }

    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))?;
    }

    let tmp = destination.with_extension("part");
    let mut file = tokio::fs::File::create(&tmp)
        .await
        .map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))?;
    }
    file.flush()
        .await
        .map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))?;
    tokio::fs::rename(&tmp, &destination)
        .await
        .map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))?;

    Ok(HttpResponse::Ok().json(DownloadFromUrlResponse {
        filename: body.filename.clone(),
    }))
}

#[derive(Debug, Serialize)]
struct DirectoryListing {
    root: String,
    entries: Vec<String>,
}

/// `GET /list_directories` — a flat listing of the three shared roots, for
/// clients choosing a filename to reference in an enqueue request.
#[get("/list_directories")]
pub async fn list_directories(
    _admitted: Admitted,
    state: web::Data<State>,
) -> Result<HttpResponse, JobError> {
    let roots: [(&str, &PathBuf); 3] = [
        ("uploads", &state.settings.uploads_root),
        ("output", &state.settings.output_root),
        ("examples", &state.settings.examples_root),
    ];

    let mut listings = Vec::with_capacity(roots.len());
    for (name, root) in roots {
        listings.push(DirectoryListing {
            root: name.to_string(),
            entries: list_entries(root).await,
        });
    }

    Ok(HttpResponse::Ok().json(listings))
}

async fn list_entries(root: &std::path::Path) -> Vec<String> {
    let mut entries = Vec::new();
    let mut read_dir = match tokio::fs::read_dir(root).await {
        Ok(rd) => rd,
        Err(_) => return entries,
    };
    while let Ok(Some(entry)) = read_dir.next_entry().await {
        if let Some(name) = entry.file_name().to_str() {
            entries.push(name.to_string());
        }
    }
    entries.sort();
    entries
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(upload)
        .service(download_from_url)
        .service(list_directories);
}
