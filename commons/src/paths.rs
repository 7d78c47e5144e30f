//! Shared-volume filename discipline (spec §4.7, §8 invariant I10).
//!
//! All client-provided file references are bare filenames (optionally with
//! one subdirectory segment) below a shared root; none of them may be
//! absolute, contain `..` segments, or carry control characters.

use crate::{ErrorKind, JobError};
use std::path::{Path, PathBuf};

/// Validate a client-supplied filename and join it under `root`.
///
/// Rejects absolute paths, any `..` segment, a leading `/`, and any
/// non-printable ASCII control character (including the null byte).
pub fn sanitize_under(root: &Path, filename: &str) -> Result<PathBuf, JobError> {
    if filename.is_empty() {
        return Err(JobError::new(ErrorKind::Validation, "empty filename"));
    }
    if filename.contains('\0') {
        return Err(JobError::new(
            ErrorKind::Validation,
            "filename contains a null byte",
        ));
    }
    if filename.chars().any(|c| c.is_control()) {
        return Err(JobError::new(
            ErrorKind::Validation,
            "filename contains a control character",
        ));
    }
    if filename.starts_with('/') || filename.starts_with('\\') {
        return Err(JobError::new(
            ErrorKind::Validation,
            "filename must not be absolute",
        ));
    }

    let candidate = Path::new(filename);
    if candidate.is_absolute() {
        return Err(JobError::new(
            ErrorKind::Validation,
            "filename must not be absolute",
        ));
    }

    for component in candidate.components() {
        use std::path::Component;
        match component {
            Component::Normal(_) => {}
            Component::CurDir => {}
            _ => {
                return Err(JobError::new(
                    ErrorKind::Validation,
                    "filename must not traverse outside the root",
                ));
            }
        }
    }

    Ok(root.join(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_and_subdir_filenames() {
        let root = Path::new("/uploads");
        assert_eq!(
            sanitize_under(root, "a.ifc").unwrap(),
            Path::new("/uploads/a.ifc")
        );
        assert_eq!(
            sanitize_under(root, "sub/a.ifc").unwrap(),
            Path::new("/uploads/sub/a.ifc")
        );
    }

    #[test]
    fn rejects_traversal_and_absolute_paths() {
        let root = Path::new("/uploads");
        assert!(sanitize_under(root, "../etc/passwd").is_err());
        assert!(sanitize_under(root, "a/../../b").is_err());
        assert!(sanitize_under(root, "/etc/passwd").is_err());
        assert!(sanitize_under(root, "").is_err());
    }

    #[test]
    fn rejects_control_characters() {
        let root = Path::new("/uploads");
        assert!(sanitize_under(root, "a\0.ifc").is_err());
        assert!(sanitize_under(root, "a\n.ifc").is_err());
    }
}
