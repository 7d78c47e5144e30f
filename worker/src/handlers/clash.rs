//! `tasks.run_ifcclash_detection` — clash detection across named model
//! groups (spec §4.5). The geometric clash algorithm itself is an
//! out-of-scope domain transformation (spec §1).

use super::HandlerContext;
use broker::codec;
use commons::{ErrorKind, JobError};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClashSet {
    name: String,
    filenames: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Request {
    clash_sets: Vec<ClashSet>,
    #[serde(default)]
    tolerance: Option<f64>,
    output_filename: String,
}

#[derive(Debug, Serialize)]
struct Response {
    success: bool,
    output_path: String,
    clash_count: u64,
    sets_checked: usize,
}

pub fn run(payload: Value, ctx: HandlerContext) -> BoxFuture<'static, Result<Value, JobError>> {
    async move {
        let request: Request = codec::decode_job(&payload)?;

        for set in &request.clash_sets {
            for filename in &set.filenames {
                let path = commons::paths::sanitize_under(&ctx.uploads_root, filename)?;
                tokio::fs::metadata(&path)
                    .await
                    .map_err(|e| JobError::new(ErrorKind::Handler, format!("{}: {}", filename, e)))?;
            }
        }

        let output_path = commons::paths::sanitize_under(
            &ctx.output_root.join("clash"),
            &request.output_filename,
        )?;
        let tolerance = request.tolerance.unwrap_or(0.01);
        let body = serde_json::json!({
            "sets": request.clash_sets.iter().map(|s| &s.name).collect::<Vec<_>>(),
            "tolerance": tolerance,
            "clashes": [],
        });
        let encoded = serde_json::to_vec_pretty(&body)
            .map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))?;

        super::write_output_atomically(&output_path, &encoded)
            .await
            .map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))?;

        let response = Response {
            success: true,
            output_path: output_path.to_string_lossy().into_owned(),
            clash_count: 0,
            sets_checked: request.clash_sets.len(),
        };
        serde_json::to_value(response).map_err(|e| JobError::new(ErrorKind::Handler, e.to_string()))
    }
    .boxed()
}
