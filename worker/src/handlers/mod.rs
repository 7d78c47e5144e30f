//! Handler bodies (spec C4). The domain transformations themselves (IFC
//! parsing, geometry, CSV/XLSX emission, clash algorithms, etc.) are
//! explicitly out of scope (spec §1); each handler here owns only the
//! shared-volume contract (read inputs, write outputs atomically) and
//! returns the structured result the gateway surfaces verbatim.

pub mod clash;
pub mod convert;
pub mod csv;
pub mod diff;
pub mod json;
pub mod patch;
pub mod qto;
pub mod tester;

use commons::JobError;
use futures::future::BoxFuture;
use serde_json::Value;
use std::path::PathBuf;

/// Roots a handler needs to resolve client-facing filenames (spec C7).
#[derive(Debug, Clone)]
pub struct HandlerContext {
    pub uploads_root: PathBuf,
    pub output_root: PathBuf,
}

/// A registered handler body: takes the job's decoded payload and the
/// shared-volume roots, returns a structured result or a terminal error.
pub type Handler = fn(Value, HandlerContext) -> BoxFuture<'static, Result<Value, JobError>>;

/// Write `contents` to `path` atomically: write to a sibling temporary
/// name, then rename into place (spec §5 "workers must write outputs
/// atomically ... so that concurrent gateway reads never see partial
/// files"). Fsyncs the containing directory after the rename so a crash
/// between rename and the job's `finished` publish cannot leave a
/// `finished` job pointing at a not-yet-durable directory entry.
pub async fn write_output_atomically(path: &std::path::Path, contents: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(parent) => parent,
        None => return tokio::fs::write(path, contents).await,
    };
    tokio::fs::create_dir_all(parent).await?;
    let tmp = path.with_extension("part");
    tokio::fs::write(&tmp, contents).await?;
    tokio::fs::rename(&tmp, path).await?;
    sync_dir(parent).await
}

async fn sync_dir(dir: &std::path::Path) -> std::io::Result<()> {
    let dir = dir.to_owned();
    tokio::task::spawn_blocking(move || std::fs::File::open(dir)?.sync_all())
        .await
        .expect("sync_dir blocking task panicked")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_file_and_leaves_no_part_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.json");

        write_output_atomically(&path, b"{}").await.unwrap();

        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"{}");
        assert!(!path.with_extension("part").exists());
    }

    #[tokio::test]
    async fn overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        tokio::fs::write(&path, b"stale").await.unwrap();

        write_output_atomically(&path, b"fresh").await.unwrap();

        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"fresh");
    }
}
