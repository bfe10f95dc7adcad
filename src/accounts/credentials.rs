use sqlx::PgPool;

use crate::accounts::AccountError;
use crate::auth::{password, validation};
use crate::db;
use crate::models::UserProfile;

/// Username/email/password-hash rows.
#[derive(Clone)]
pub struct CredentialStore {
    pool: PgPool,
}

impl CredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Validates, hashes and inserts a new account.
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, AccountError> {
        validation::check_registration(username, email, password)
            .map_err(|msg| AccountError::Validation(msg.to_string()))?;

        let pw_hash = password::hash(password).map_err(|e| {
            tracing::error!("Password hashing failed for '{username}': {e}");
            AccountError::Hashing(e)
        })?;

        match db::users::create(&self.pool, username, email, &pw_hash).await {
            Ok(user) => {
                tracing::info!("User '{}' created with ID: {}", user.username, user.id);
                Ok(user.into())
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                tracing::warn!("Registration conflict for '{username}'");
                let msg = match db_err.constraint() {
                    Some("users_username_key") => "Username already exists.",
                    Some("users_email_key") => "Email already exists.",
                    _ => "Username or Email already exists.",
                };
                Err(AccountError::Conflict(msg.to_string()))
            }
            Err(e) => {
                tracing::error!("Error creating user '{username}': {e}");
                Err(AccountError::Store(e))
            }
        }
    }

    /// True only when the user exists and the password matches. Store and
    /// hash errors fail closed.
    pub async fn verify(&self, username: &str, password: &str) -> bool {
        let user = match db::users::find_by_username(&self.pool, username).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::warn!("Failed login attempt for '{username}': no such user");
                return false;
            }
            Err(e) => {
                tracing::error!("Error verifying user '{username}': {e}");
                return false;
            }
        };

        match password::verify(password, &user.password_hash) {
            Ok(true) => {
                tracing::info!("User '{username}' authenticated");
                true
            }
            Ok(false) => {
                tracing::warn!("Failed login attempt for '{username}': invalid credentials");
                false
            }
            Err(e) => {
                tracing::error!("Stored hash for '{username}' is unusable: {e}");
                false
            }
        }
    }

    pub async fn lookup_by_email(&self, email: &str) -> Result<Option<UserProfile>, AccountError> {
        if email.is_empty() {
            return Ok(None);
        }
        Ok(db::users::find_profile_by_email(&self.pool, email).await?)
    }

    pub async fn lookup_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserProfile>, AccountError> {
        if username.is_empty() {
            return Ok(None);
        }
        Ok(db::users::find_profile_by_username(&self.pool, username).await?)
    }

    /// Replaces the password of the account named by `identifier`, which is
    /// tried first as an email and then as a username.
    pub async fn update_password(
        &self,
        identifier: &str,
        new_password: &str,
    ) -> Result<UserProfile, AccountError> {
        validation::check_password(new_password)
            .map_err(|msg| AccountError::Validation(msg.to_string()))?;

        let user = match self.lookup_by_email(identifier).await? {
            Some(user) => user,
            None => self.lookup_by_username(identifier).await?.ok_or_else(|| {
                AccountError::NotFound("No account found with that username or email.".to_string())
            })?,
        };

        let pw_hash = password::hash(new_password).map_err(|e| {
            tracing::error!("Password hashing failed for '{}': {e}", user.username);
            AccountError::Hashing(e)
        })?;

        let updated = db::users::update_password(&self.pool, user.id, &pw_hash).await?;
        if updated == 0 {
            tracing::warn!("Password update matched no row for '{}'", user.email);
            return Err(AccountError::NotFound(
                "No account found with that username or email.".to_string(),
            ));
        }

        tracing::info!("Password updated for user '{}'", user.username);
        Ok(user)
    }
}
