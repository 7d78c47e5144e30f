//! Scheduled cleanup of aged output entries under `/output/clash` and
//! `/output/diff` (spec §4.7): "A scheduled cleanup collaborator sweeps
//! aged entries ... after a configurable age (default 7 days) and removes
//! empty subdirectories." Spawned only by the worker bound to `ifcclash`
//! or `ifcdiff` (`SPEC_FULL.md`: "implemented as a lightweight periodic
//! sweep spawned by the worker binaries that own those queues").

use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Per-queue subdirectory under `output_root` this worker's kind owns, if
/// it is one of the two kinds this sweep applies to.
pub fn swept_subdir(queue: &str) -> Option<&'static str> {
    match queue {
        "ifcclash" => Some("clash"),
        "ifcdiff" => Some("diff"),
        _ => None,
    }
}

/// Run the sweep loop forever, firing every `interval` and removing any
/// file under `root` whose modification time is older than `max_age`, then
/// any subdirectory left empty by that removal.
pub async fn run(root: PathBuf, max_age: Duration, interval: Duration) {
    loop {
        tokio::time::sleep(interval).await;
        if let Err(e) = sweep_once(&root, max_age).await {
            warn!("cleanup sweep of {} failed: {}", root.display(), e);
        }
    }
}

async fn sweep_once(root: &Path, max_age: Duration) -> std::io::Result<()> {
    let now = SystemTime::now();
    let mut removed = 0u64;

    let mut dirs = vec![root.to_path_buf()];
    while let Some(dir) = dirs.pop() {
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        };

        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if metadata.is_dir() {
                dirs.push(entry.path());
                continue;
            }

            let age = now
                .duration_since(metadata.modified()?)
                .unwrap_or(Duration::ZERO);
            if age > max_age {
                tokio::fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }
    }

    remove_empty_subdirs(root).await?;

    if removed > 0 {
        info!("cleanup sweep of {} removed {} aged file(s)", root.display(), removed);
    }
    Ok(())
}

/// Remove every subdirectory of `root` left empty by a sweep. Does not
/// remove `root` itself.
async fn remove_empty_subdirs(root: &Path) -> std::io::Result<()> {
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    let mut subdirs = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.metadata().await?.is_dir() {
            subdirs.push(entry.path());
        }
    }

    for dir in subdirs {
        Box::pin(remove_empty_subdirs(&dir)).await?;
        let is_empty = tokio::fs::read_dir(&dir).await?.next_entry().await?.is_none();
        if is_empty {
            tokio::fs::remove_dir(&dir).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn removes_only_aged_files_and_prunes_empty_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().to_path_buf();

        let sub = root.join("set-a");
        tokio::fs::create_dir_all(&sub).await.unwrap();
        let stale = sub.join("old.json");
        tokio::fs::write(&stale, b"{}").await.unwrap();

        let fresh_dir = root.join("set-b");
        tokio::fs::create_dir_all(&fresh_dir).await.unwrap();
        let fresh = fresh_dir.join("new.json");
        tokio::fs::write(&fresh, b"{}").await.unwrap();

        // Backdate the stale file's mtime past the cutoff.
        let old_time = SystemTime::now() - Duration::from_secs(10 * 24 * 60 * 60);
        filetime::set_file_mtime(&stale, filetime::FileTime::from_system_time(old_time)).unwrap();

        sweep_once(&root, Duration::from_secs(7 * 24 * 60 * 60))
            .await
            .unwrap();

        assert!(!sub.exists(), "the now-empty set-a directory should be pruned");
        assert!(fresh.exists(), "the fresh file must survive the sweep");
    }

    #[test]
    fn only_clash_and_diff_are_swept() {
        assert_eq!(swept_subdir("ifcclash"), Some("clash"));
        assert_eq!(swept_subdir("ifcdiff"), Some("diff"));
        assert_eq!(swept_subdir("ifcconvert"), None);
    }
}
