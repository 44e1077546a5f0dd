//! Path traversal guard for orchestrator-supplied input filenames.
//!
//! Grounded in `original_source/services/orchestrator-service/path_validation.py`.
//! The Python version resolves lexically even for files that don't exist yet
//! (`Path.resolve()` without `strict=True`); this port instead follows the
//! teacher's `std::fs::canonicalize` idiom (see
//! `scrapers/dome_replay_ingest.rs`), which requires the target to exist —
//! acceptable here because validation always immediately precedes a read.

use std::path::{Path, PathBuf};

use crate::domain::SurveillanceError;

/// Checks the bare filename (no directory component) against
/// `[A-Za-z0-9._-]{1,255}`, rejecting a leading or trailing `.` and any
/// path separator. Runs before symlink resolution, so a name that is
/// syntactically invalid is rejected without ever touching the filesystem.
fn validate_filename_syntax(input_file: &str) -> Result<(), SurveillanceError> {
    let name = Path::new(input_file)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    let valid_chars = !name.is_empty()
        && name.len() <= 255
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-');

    if !valid_chars || name.starts_with('.') || name.ends_with('.') {
        return Err(SurveillanceError::InputMalformed {
            reason: format!("invalid input filename: {input_file:?}"),
        });
    }
    Ok(())
}

/// Resolves `input_file` against `input_dir`, rejecting anything that
/// escapes it once symlinks and `..` components are resolved.
///
/// `input_file` may be relative (joined onto `input_dir`) or absolute (must
/// itself resolve inside `input_dir`).
pub fn validate_input_path(input_file: &str, input_dir: &str) -> Result<PathBuf, SurveillanceError> {
    validate_filename_syntax(input_file)?;

    let input_dir_resolved = std::fs::canonicalize(input_dir).map_err(|_| SurveillanceError::InputNotFound {
        path: input_dir.to_string(),
    })?;

    let candidate = Path::new(input_file);
    let joined = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        input_dir_resolved.join(candidate)
    };

    let resolved = std::fs::canonicalize(&joined).map_err(|_| SurveillanceError::InputNotFound {
        path: input_file.to_string(),
    })?;

    if resolved.starts_with(&input_dir_resolved) {
        Ok(resolved)
    } else {
        Err(SurveillanceError::ValidationFailed {
            reason: format!(
                "path must be within INPUT_DIR (provided: {input_file}, resolved: {}, allowed: {})",
                resolved.display(),
                input_dir_resolved.display()
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn relative_filename_resolves_inside_input_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("transactions.csv");
        fs::write(&file_path, "data").unwrap();

        let resolved = validate_input_path("transactions.csv", dir.path().to_str().unwrap()).unwrap();
        assert_eq!(resolved, fs::canonicalize(&file_path).unwrap());
    }

    #[test]
    fn traversal_outside_input_dir_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let outside_file = outside.path().join("secret.csv");
        fs::write(&outside_file, "data").unwrap();

        let relative = format!(
            "../{}/secret.csv",
            outside.path().file_name().unwrap().to_str().unwrap()
        );
        // Only a meaningful traversal check when outside/ is a sibling of dir/;
        // tempdir() always allocates siblings under the same base, so this holds.
        let result = validate_input_path(&relative, dir.path().to_str().unwrap());
        assert!(result.is_err());
    }

    #[test]
    fn missing_file_is_reported_as_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_input_path("missing.csv", dir.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, SurveillanceError::InputNotFound { .. }));
    }

    #[test]
    fn filenames_with_disallowed_characters_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        for bad in ["trans actions.csv", ".hidden.csv", "trailing.dot."] {
            let err = validate_input_path(bad, dir.path().to_str().unwrap()).unwrap_err();
            assert!(matches!(err, SurveillanceError::InputMalformed { .. }), "{bad} should be rejected");
        }
    }
}
