use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set,
};
use tracing::info;
use uuid::Uuid;

use crate::database::entities::{round_types, sessions, statuses, users};
use crate::errors::{AuthError, AuthResult};

/// Statuses every new account starts with: name, color, sort order, terminal.
const DEFAULT_STATUSES: &[(&str, &str, i32, bool)] = &[
    ("Saved", "#6b7280", 0, false),
    ("Applied", "#3b82f6", 1, false),
    ("Interviewing", "#f59e0b", 2, false),
    ("Offer", "#10b981", 3, true),
    ("Rejected", "#ef4444", 4, true),
];

const DEFAULT_ROUND_TYPES: &[&str] = &[
    "Phone Screen",
    "Technical Interview",
    "System Design",
    "Behavioral",
    "Onsite",
];

/// Service for account registration and bearer-token sessions.
#[derive(Clone)]
pub struct AuthService {
    db: DatabaseConnection,
}

impl AuthService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Hash a password using bcrypt
    pub fn hash_password(password: &str) -> AuthResult<String> {
        if password.len() < 8 {
            return Err(AuthError::WeakPassword(
                "must be at least 8 characters long".to_string(),
            ));
        }
        Ok(hash(password, DEFAULT_COST)?)
    }

    /// Verify a password against a stored hash
    pub fn verify_password(password: &str, password_hash: &str) -> AuthResult<bool> {
        Ok(verify(password, password_hash)?)
    }

    /// Validate email format
    pub fn validate_email(email: &str) -> AuthResult<()> {
        if email.is_empty() {
            return Err(AuthError::InvalidEmail("cannot be empty".to_string()));
        }
        if email.len() > 254 {
            return Err(AuthError::InvalidEmail("too long".to_string()));
        }

        let parts: Vec<&str> = email.split('@').collect();
        if parts.len() != 2 {
            return Err(AuthError::InvalidEmail(
                "must contain exactly one @".to_string(),
            ));
        }
        let (local_part, domain_part) = (parts[0], parts[1]);
        if local_part.is_empty() || domain_part.is_empty() {
            return Err(AuthError::InvalidEmail(
                "local and domain parts cannot be empty".to_string(),
            ));
        }
        if !domain_part.contains('.')
            || domain_part.starts_with('.')
            || domain_part.ends_with('.')
        {
            return Err(AuthError::InvalidEmail(
                "domain must contain a dot".to_string(),
            ));
        }

        Ok(())
    }

    /// Session expiration time (24 hours from now)
    pub fn session_expiry() -> chrono::DateTime<Utc> {
        Utc::now() + Duration::hours(24)
    }

    /// Check if a session is expired
    pub fn is_session_expired(expires_at: chrono::DateTime<Utc>) -> bool {
        Utc::now() > expires_at
    }

    /// Register a new account, seed its defaults, and open a session.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> AuthResult<(users::Model, sessions::Model)> {
        Self::validate_email(email)?;
        let password_hash = Self::hash_password(password)?;

        let existing = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(AuthError::EmailExists);
        }

        let display_name = if display_name.trim().is_empty() {
            email.to_string()
        } else {
            display_name.trim().to_string()
        };

        let mut user = users::ActiveModel::new();
        user.email = Set(email.to_string());
        user.password_hash = Set(password_hash);
        user.display_name = Set(display_name);
        let user = user.insert(&self.db).await?;

        self.seed_defaults(&user.id).await?;
        let session = self.create_session(&user.id).await?;

        info!(user_id = user.id.as_str(), "registered new account");
        Ok((user, session))
    }

    /// Log in with email and password, opening a fresh session.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> AuthResult<(users::Model, sessions::Model)> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !Self::verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let session = self.create_session(&user.id).await?;
        Ok((user, session))
    }

    /// Resolve a bearer token to its user. Expired sessions are deleted on
    /// sight rather than left to accumulate.
    pub async fn authenticate(&self, token: &str) -> AuthResult<users::Model> {
        let session = sessions::Entity::find_by_id(token)
            .one(&self.db)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        if Self::is_session_expired(session.expires_at) {
            let user_id = session.user_id.clone();
            session.delete(&self.db).await?;
            info!(user_id = user_id.as_str(), "removed expired session");
            return Err(AuthError::SessionExpired);
        }

        users::Entity::find_by_id(&session.user_id)
            .one(&self.db)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Delete a session token. Unknown tokens are a no-op.
    pub async fn logout(&self, token: &str) -> AuthResult<()> {
        sessions::Entity::delete_by_id(token).exec(&self.db).await?;
        Ok(())
    }

    async fn create_session(&self, user_id: &str) -> AuthResult<sessions::Model> {
        let session = sessions::ActiveModel::new(user_id.to_string(), Self::session_expiry());
        Ok(session.insert(&self.db).await?)
    }

    /// Seed the starter statuses and round types for a new account.
    async fn seed_defaults(&self, user_id: &str) -> AuthResult<()> {
        for (name, color, sort_order, is_terminal) in DEFAULT_STATUSES {
            let status = statuses::ActiveModel {
                id: Set(Uuid::new_v4().to_string()),
                user_id: Set(user_id.to_string()),
                name: Set(name.to_string()),
                color: Set(Some(color.to_string())),
                sort_order: Set(*sort_order),
                is_terminal: Set(*is_terminal),
                created_at: Set(Utc::now()),
                updated_at: Set(Utc::now()),
            };
            status.insert(&self.db).await?;
        }

        for (sort_order, name) in DEFAULT_ROUND_TYPES.iter().enumerate() {
            let round_type = round_types::ActiveModel {
                id: Set(Uuid::new_v4().to_string()),
                user_id: Set(user_id.to_string()),
                name: Set(name.to_string()),
                sort_order: Set(sort_order as i32),
                created_at: Set(Utc::now()),
                updated_at: Set(Utc::now()),
            };
            round_type.insert(&self.db).await?;
        }

        Ok(())
    }
}
