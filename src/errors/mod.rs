//! Domain-specific error types for jobtrail
//!
//! This module provides structured error types for the different domains in
//! the application, making error handling consistent and debuggable.
//!
//! # Error Categories
//!
//! - **TransferError**: export/import operations (archive safety, document
//!   shape, checksum enforcement)
//! - **StoreError**: content-addressed file store operations
//! - **AuthError**: authentication and session errors
//!
//! # Examples
//!
//! ```rust
//! use jobtrail::errors::TransferError;
//!
//! let err = TransferError::UnsafeArchive("too many files".to_string());
//! assert!(err.is_client_error());
//! ```

pub mod auth;
pub mod store;
pub mod transfer;

pub use auth::AuthError;
pub use store::StoreError;
pub use transfer::TransferError;

/// Result type alias for export/import operations
pub type TransferResult<T> = Result<T, TransferError>;

/// Result type alias for file store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_result_alias() {
        let result: TransferResult<()> =
            Err(TransferError::ImportFailed("test".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_store_result_alias() {
        let result: StoreResult<String> = Err(StoreError::PathEscape("../x".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_auth_result_alias() {
        let result: AuthResult<()> = Err(AuthError::InvalidCredentials);
        assert!(result.is_err());
    }
}
