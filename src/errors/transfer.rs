//! Export and import error types
//!
//! Structured errors for the archive export/import pipeline: archive safety
//! validation, export document shape checks, checksum enforcement, and the
//! surrounding database and I/O failures.
//!
//! # Examples
//!
//! ```rust
//! use jobtrail::errors::TransferError;
//!
//! // A rejected hostile archive
//! let err = TransferError::UnsafeArchive("path traversal: ../../etc/passwd".to_string());
//!
//! // A tampered bundled file
//! let err = TransferError::ChecksumMismatch {
//!     path: "applications/Acme - Engineer (ab12cd34)/resume.pdf".to_string(),
//!     expected: "deadbeef".to_string(),
//!     actual: "cafebabe".to_string(),
//! };
//! ```

use thiserror::Error;

/// Export/import operation errors
#[derive(Error, Debug)]
pub enum TransferError {
    /// Archive failed pre-extraction safety validation. The reason string is
    /// human readable ("too many files", "path traversal", ...). Never
    /// retryable; the archive is discarded.
    #[error("archive validation failed: {0}")]
    UnsafeArchive(String),

    /// Export document failed shape or version validation
    #[error("invalid export document: {0}")]
    InvalidDocument(String),

    /// A bundled file's content hash does not match the manifest. Treated as
    /// a tampering signal: the whole import aborts.
    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// Export operation failed
    #[error("export failed: {0}")]
    ExportFailed(String),

    /// Import operation failed
    #[error("import failed: {0}")]
    ImportFailed(String),

    /// Archive container error
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// JSON serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// File store error
    #[error("file store error: {0}")]
    Store(#[from] super::StoreError),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransferError {
    /// Check if this is a client error (400-series)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TransferError::UnsafeArchive(_)
                | TransferError::InvalidDocument(_)
                | TransferError::ChecksumMismatch { .. }
        )
    }

    /// Check if this is a server error (500-series)
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            TransferError::UnsafeArchive(_) => "UNSAFE_ARCHIVE",
            TransferError::InvalidDocument(_) => "INVALID_DOCUMENT",
            TransferError::ChecksumMismatch { .. } => "CHECKSUM_MISMATCH",
            TransferError::ExportFailed(_) => "EXPORT_FAILED",
            TransferError::ImportFailed(_) => "IMPORT_FAILED",
            TransferError::Archive(_) => "ARCHIVE_ERROR",
            TransferError::Serialization(_) => "SERIALIZATION_ERROR",
            TransferError::Store(_) => "STORE_ERROR",
            TransferError::Database(_) => "DATABASE_ERROR",
            TransferError::Io(_) => "IO_ERROR",
        }
    }
}
