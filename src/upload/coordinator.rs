//! Upload coordination — local validation and lifecycle tracking.
//!
//! Validation happens entirely client-side before any network traffic:
//! accepted extensions, the 10 MB size cap, and the single-tracked-file rule.
//! The coordinator also remembers the uploaded file's display name, which the
//! audio download path later uses to suggest a filename.
//!
//! The UI transitions tied to the lifecycle (reset/show the extraction sink,
//! hide stale result cards, show preview and options) live in the app layer;
//! this module owns the decisions, not the widgets.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// File extensions the server can extract text from.
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["pdf", "jpg", "jpeg", "png", "txt"];

/// Upload size cap in megabytes.
pub const MAX_FILE_MB: u64 = 10;

const MAX_FILE_BYTES: u64 = MAX_FILE_MB * 1024 * 1024;

// ---------------------------------------------------------------------------
// UploadValidationError
// ---------------------------------------------------------------------------

/// Rejections raised before the file ever leaves the machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadValidationError {
    #[error("You can't upload files of this type. Allowed: pdf, jpg, jpeg, png, txt.")]
    UnsupportedType,

    #[error("File is too big ({size_mb} MB). Max filesize: {MAX_FILE_MB} MB.")]
    TooBig { size_mb: u64 },

    #[error("You can only upload 1 file at a time.")]
    UploadInFlight,

    #[error("File not found: {0}")]
    NotFound(String),
}

// ---------------------------------------------------------------------------
// UploadCoordinator
// ---------------------------------------------------------------------------

/// Tracks at most one file through the upload lifecycle.
#[derive(Debug, Default)]
pub struct UploadCoordinator {
    /// Display name of the most recently accepted file. Survives a successful
    /// upload (the download filename derives from it); cleared on failure so
    /// the user can retry cleanly.
    file_name: Option<String>,
    in_flight: bool,
}

impl UploadCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `path` and begin tracking it as the in-flight upload.
    ///
    /// A new accepted file supersedes any previously tracked one; the caller
    /// clears stale result UI as part of its submit-start handling.
    pub fn begin(&mut self, path: &Path) -> Result<PathBuf, UploadValidationError> {
        if self.in_flight {
            return Err(UploadValidationError::UploadInFlight);
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(UploadValidationError::UnsupportedType);
        }

        let metadata = std::fs::metadata(path)
            .map_err(|_| UploadValidationError::NotFound(path.display().to_string()))?;
        if !metadata.is_file() {
            return Err(UploadValidationError::NotFound(path.display().to_string()));
        }
        if metadata.len() > MAX_FILE_BYTES {
            return Err(UploadValidationError::TooBig {
                size_mb: metadata.len() / (1024 * 1024),
            });
        }

        self.file_name = Some(
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "document".to_owned()),
        );
        self.in_flight = true;
        Ok(path.to_path_buf())
    }

    /// The server accepted the upload; keep the file name for the download
    /// path and allow the next upload.
    pub fn finish_success(&mut self) {
        self.in_flight = false;
    }

    /// The upload failed; drop the tracked file so a retry starts clean.
    pub fn finish_error(&mut self) {
        self.in_flight = false;
        self.file_name = None;
    }

    /// Whether an upload is currently outstanding (disables the trigger).
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Display name of the last accepted file, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str, bytes: usize) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&vec![0u8; bytes]).unwrap();
        path
    }

    #[test]
    fn accepts_allowed_extensions_case_insensitively() {
        let dir = tempdir().unwrap();
        for name in ["a.pdf", "b.txt", "c.PNG", "d.Jpg", "e.jpeg"] {
            let path = touch(dir.path(), name, 10);
            let mut coordinator = UploadCoordinator::new();
            assert!(coordinator.begin(&path).is_ok(), "{name} should be accepted");
        }
    }

    #[test]
    fn rejects_unsupported_type() {
        let dir = tempdir().unwrap();
        let path = touch(dir.path(), "notes.docx", 10);
        let mut coordinator = UploadCoordinator::new();
        assert_eq!(
            coordinator.begin(&path),
            Err(UploadValidationError::UnsupportedType)
        );
        assert!(coordinator.file_name().is_none());
    }

    #[test]
    fn rejects_missing_extension() {
        let dir = tempdir().unwrap();
        let path = touch(dir.path(), "README", 10);
        let mut coordinator = UploadCoordinator::new();
        assert_eq!(
            coordinator.begin(&path),
            Err(UploadValidationError::UnsupportedType)
        );
    }

    #[test]
    fn rejects_oversized_file() {
        let dir = tempdir().unwrap();
        let path = touch(dir.path(), "big.txt", (MAX_FILE_BYTES + 1) as usize);
        let mut coordinator = UploadCoordinator::new();
        assert!(matches!(
            coordinator.begin(&path),
            Err(UploadValidationError::TooBig { .. })
        ));
    }

    #[test]
    fn accepts_file_exactly_at_cap() {
        let dir = tempdir().unwrap();
        let path = touch(dir.path(), "cap.txt", MAX_FILE_BYTES as usize);
        let mut coordinator = UploadCoordinator::new();
        assert!(coordinator.begin(&path).is_ok());
    }

    #[test]
    fn rejects_second_upload_while_in_flight() {
        let dir = tempdir().unwrap();
        let first = touch(dir.path(), "one.txt", 5);
        let second = touch(dir.path(), "two.txt", 5);

        let mut coordinator = UploadCoordinator::new();
        coordinator.begin(&first).unwrap();
        assert_eq!(
            coordinator.begin(&second),
            Err(UploadValidationError::UploadInFlight)
        );
    }

    #[test]
    fn success_keeps_file_name_and_allows_next_upload() {
        let dir = tempdir().unwrap();
        let path = touch(dir.path(), "report.pdf", 5);

        let mut coordinator = UploadCoordinator::new();
        coordinator.begin(&path).unwrap();
        coordinator.finish_success();

        assert!(!coordinator.in_flight());
        assert_eq!(coordinator.file_name(), Some("report.pdf"));

        let next = touch(dir.path(), "next.txt", 5);
        assert!(coordinator.begin(&next).is_ok());
        assert_eq!(coordinator.file_name(), Some("next.txt"));
    }

    #[test]
    fn error_drops_tracked_file_for_retry() {
        let dir = tempdir().unwrap();
        let path = touch(dir.path(), "broken.pdf", 5);

        let mut coordinator = UploadCoordinator::new();
        coordinator.begin(&path).unwrap();
        coordinator.finish_error();

        assert!(!coordinator.in_flight());
        assert!(coordinator.file_name().is_none());
        assert!(coordinator.begin(&path).is_ok());
    }

    #[test]
    fn nonexistent_path_is_not_found() {
        let mut coordinator = UploadCoordinator::new();
        assert!(matches!(
            coordinator.begin(Path::new("/no/such/file.txt")),
            Err(UploadValidationError::NotFound(_))
        ));
    }
}
