//! File upload helpers
//!
//! Uploads (PMode XML, trust store files, certificates) are multipart form
//! submissions. The size precheck runs client-side, before any bytes go on
//! the wire, so an oversized file never produces a half-submitted request.

use super::error::RestError;
use std::path::Path;

/// Default upload ceiling; the gateway rejects larger payloads anyway
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// A file read and validated, ready to become a multipart part
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Validate size limits without reading the file
pub fn validate_file_size(len: u64, max_bytes: u64) -> Result<(), RestError> {
    if len == 0 {
        return Err(RestError::Validation(
            "Could not submit: the file is empty".to_string(),
        ));
    }
    if len > max_bytes {
        return Err(RestError::Validation(format!(
            "Could not submit: the file exceeds the maximum size of {} MB",
            max_bytes / (1024 * 1024)
        )));
    }
    Ok(())
}

/// Read a file from disk, applying the size precheck first
pub fn read_validated(path: &Path, max_bytes: u64) -> Result<UploadFile, RestError> {
    let meta = std::fs::metadata(path)
        .map_err(|e| RestError::Validation(format!("Cannot read {}: {}", path.display(), e)))?;
    validate_file_size(meta.len(), max_bytes)?;

    let bytes = std::fs::read(path)
        .map_err(|e| RestError::Validation(format!("Cannot read {}: {}", path.display(), e)))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    Ok(UploadFile { file_name, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_rejected() {
        let err = validate_file_size(0, DEFAULT_MAX_UPLOAD_BYTES).unwrap_err();
        assert!(err.user_message().contains("empty"));
    }

    #[test]
    fn test_oversized_file_is_rejected() {
        let err = validate_file_size(DEFAULT_MAX_UPLOAD_BYTES + 1, DEFAULT_MAX_UPLOAD_BYTES);
        assert!(err.is_err());
    }

    #[test]
    fn test_file_at_limit_passes() {
        assert!(validate_file_size(DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_MAX_UPLOAD_BYTES).is_ok());
    }
}
