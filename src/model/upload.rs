//! Upload form state and local file validation

use std::path::{Path, PathBuf};
use thiserror::Error;

pub const UPLOAD_FAILED: &str = "Upload failed. Please check the file format.";

/// Columns the server expects in an uploaded CSV
pub const REQUIRED_COLUMNS: &str = "Equipment Name, Type, Flowrate, Pressure, Temperature";

/// Reasons a chosen file is refused before any request is made
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("Only CSV files are allowed.")]
    NotCsv,
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Not a regular file: {0}")]
    NotAFile(String),
}

/// Media type a file would be declared with, derived from its extension
pub fn media_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("csv") => "text/csv",
        Some("txt") => "text/plain",
        Some("json") => "application/json",
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}

/// Clean up a path that was pasted or dropped onto the terminal.
///
/// Terminals quote paths containing spaces, escape them with backslashes, or
/// paste `file://` URIs depending on the platform.
pub fn normalize_pasted_path(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = ['\'', '"']
        .iter()
        .find_map(|q| {
            trimmed
                .strip_prefix(*q)
                .and_then(|rest| rest.strip_suffix(*q))
        })
        .unwrap_or(trimmed);
    let without_scheme = unquoted.strip_prefix("file://").unwrap_or(unquoted);
    without_scheme.replace("\\ ", " ")
}

/// Check a candidate upload; the type check runs first and needs no filesystem access
pub fn validate_upload_path(raw: &str) -> Result<PathBuf, UploadRejection> {
    let path = PathBuf::from(normalize_pasted_path(raw));
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    if media_type(&path) != "text/csv" && !name.ends_with(".csv") {
        return Err(UploadRejection::NotCsv);
    }
    if !path.exists() {
        return Err(UploadRejection::NotFound(path.display().to_string()));
    }
    if !path.is_file() {
        return Err(UploadRejection::NotAFile(path.display().to_string()));
    }
    Ok(path)
}

/// State of the upload view
#[derive(Debug, Default)]
pub struct UploadForm {
    /// Path being typed
    pub input: String,
    pending: Option<PathBuf>,
    error: Option<String>,
    uploading: bool,
}

impl UploadForm {
    #[cfg(test)]
    pub fn pending(&self) -> Option<&Path> {
        self.pending.as_deref()
    }

    pub fn pending_name(&self) -> Option<String> {
        self.pending
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    /// Offer a file. A rejected file leaves any earlier pending file in place.
    pub fn offer(&mut self, raw: &str) -> bool {
        match validate_upload_path(raw) {
            Ok(path) => {
                self.pending = Some(path);
                self.error = None;
                self.input.clear();
                true
            }
            Err(rejection) => {
                self.error = Some(rejection.to_string());
                false
            }
        }
    }

    /// Start an upload. `None` when nothing is pending or one is already running.
    pub fn begin_submit(&mut self) -> Option<PathBuf> {
        if self.uploading {
            return None;
        }
        let path = self.pending.clone()?;
        self.uploading = true;
        self.error = None;
        Some(path)
    }

    pub fn finish_success(&mut self) {
        self.uploading = false;
        self.pending = None;
        self.error = None;
    }

    pub fn finish_failure(&mut self) {
        self.uploading = false;
        self.error = Some(UPLOAD_FAILED.to_string());
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_non_csv_rejected_without_touching_disk() {
        assert_eq!(
            validate_upload_path("/definitely/missing/data.txt"),
            Err(UploadRejection::NotCsv)
        );
        assert_eq!(UploadRejection::NotCsv.to_string(), "Only CSV files are allowed.");
    }

    #[test]
    fn test_uppercase_extension_passes_media_type_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("DATA.CSV");
        fs::write(&path, "a,b\n").unwrap();
        assert_eq!(validate_upload_path(path.to_str().unwrap()), Ok(path));
    }

    #[test]
    fn test_missing_and_directory_paths() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.csv");
        assert!(matches!(
            validate_upload_path(missing.to_str().unwrap()),
            Err(UploadRejection::NotFound(_))
        ));

        let folder = dir.path().join("folder.csv");
        fs::create_dir(&folder).unwrap();
        assert!(matches!(
            validate_upload_path(folder.to_str().unwrap()),
            Err(UploadRejection::NotAFile(_))
        ));
    }

    #[test]
    fn test_normalize_pasted_path() {
        assert_eq!(normalize_pasted_path("  '/tmp/my data.csv'\n"), "/tmp/my data.csv");
        assert_eq!(normalize_pasted_path("\"/tmp/a.csv\""), "/tmp/a.csv");
        assert_eq!(normalize_pasted_path("/tmp/my\\ data.csv"), "/tmp/my data.csv");
        assert_eq!(normalize_pasted_path("file:///tmp/a.csv"), "/tmp/a.csv");
    }

    #[test]
    fn test_rejection_keeps_previous_pending_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plant.csv");
        fs::write(&path, "x").unwrap();

        let mut form = UploadForm::default();
        assert!(form.offer(path.to_str().unwrap()));
        assert!(!form.offer("notes.txt"));
        assert_eq!(form.pending(), Some(path.as_path()));
        assert_eq!(form.error(), Some("Only CSV files are allowed."));
    }

    #[test]
    fn test_submit_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plant.csv");
        fs::write(&path, "x").unwrap();

        let mut form = UploadForm::default();
        assert_eq!(form.begin_submit(), None);

        form.offer(path.to_str().unwrap());
        assert_eq!(form.begin_submit(), Some(path.clone()));
        // in flight: second submit is ignored
        assert_eq!(form.begin_submit(), None);

        form.finish_failure();
        assert_eq!(form.error(), Some(UPLOAD_FAILED));
        assert_eq!(form.pending(), Some(path.as_path()));

        assert!(form.begin_submit().is_some());
        form.finish_success();
        assert!(form.pending().is_none());
        assert!(!form.is_uploading());
    }
}
