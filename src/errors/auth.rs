//! Authentication and session error types
//!
//! # Examples
//!
//! ```rust
//! use jobtrail::errors::AuthError;
//!
//! let err = AuthError::InvalidCredentials;
//! assert_eq!(err.http_status_code(), 401);
//! ```

use thiserror::Error;

/// Authentication and session errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Invalid credentials provided
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// User not found
    #[error("User not found")]
    UserNotFound,

    /// Session not found
    #[error("Session not found")]
    SessionNotFound,

    /// Session has expired
    #[error("Session expired")]
    SessionExpired,

    /// Missing authentication
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Invalid email format
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Email is already registered
    #[error("Email already exists")]
    EmailExists,

    /// Password does not meet requirements
    #[error("Password does not meet requirements: {0}")]
    WeakPassword(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Password hashing failed
    #[error("Password hashing error: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
}

impl AuthError {
    /// Check if this is an authentication error (401)
    pub fn is_authentication_error(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials
                | AuthError::SessionNotFound
                | AuthError::SessionExpired
                | AuthError::AuthenticationRequired
        )
    }

    /// Check if this is a validation error (400)
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidEmail(_) | AuthError::WeakPassword(_)
        )
    }

    /// Get HTTP status code for this error
    pub fn http_status_code(&self) -> u16 {
        match self {
            AuthError::InvalidCredentials
            | AuthError::SessionNotFound
            | AuthError::SessionExpired
            | AuthError::AuthenticationRequired => 401,
            AuthError::UserNotFound => 404,
            AuthError::InvalidEmail(_) | AuthError::WeakPassword(_) => 400,
            AuthError::EmailExists => 409,
            AuthError::Database(_) | AuthError::Hashing(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::UserNotFound => "USER_NOT_FOUND",
            AuthError::SessionNotFound => "SESSION_NOT_FOUND",
            AuthError::SessionExpired => "SESSION_EXPIRED",
            AuthError::AuthenticationRequired => "AUTHENTICATION_REQUIRED",
            AuthError::InvalidEmail(_) => "INVALID_EMAIL",
            AuthError::EmailExists => "EMAIL_EXISTS",
            AuthError::WeakPassword(_) => "WEAK_PASSWORD",
            AuthError::Database(_) => "DATABASE_ERROR",
            AuthError::Hashing(_) => "HASHING_ERROR",
        }
    }
}
