//! Content-addressed file store error types

use thiserror::Error;

/// File store operation errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// A relative path resolved outside the configured upload root
    #[error("path escapes upload root: {0}")]
    PathEscape(String),

    /// The referenced blob does not exist
    #[error("file not found: {0}")]
    NotFound(String),

    /// File content was rejected by type validation
    #[error("unsupported file content: detected {0}")]
    UnsupportedContent(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Check if this is a client error (400-series)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StoreError::PathEscape(_) | StoreError::UnsupportedContent(_)
        )
    }

    /// Check if this is a not found error (404)
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            StoreError::PathEscape(_) => "PATH_ESCAPE",
            StoreError::NotFound(_) => "FILE_NOT_FOUND",
            StoreError::UnsupportedContent(_) => "UNSUPPORTED_CONTENT",
            StoreError::Io(_) => "IO_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_escape() {
        let err = StoreError::PathEscape("../../etc/passwd".to_string());
        assert_eq!(err.to_string(), "path escapes upload root: ../../etc/passwd");
        assert!(err.is_client_error());
        assert_eq!(err.error_code(), "PATH_ESCAPE");
    }

    #[test]
    fn test_not_found() {
        let err = StoreError::NotFound("documents/missing.pdf".to_string());
        assert!(err.is_not_found());
        assert_eq!(err.error_code(), "FILE_NOT_FOUND");
    }

    #[test]
    fn test_unsupported_content() {
        let err = StoreError::UnsupportedContent("application/octet-stream".to_string());
        assert!(err.is_client_error());
        assert_eq!(err.error_code(), "UNSUPPORTED_CONTENT");
    }
}
