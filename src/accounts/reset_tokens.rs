use chrono::{Duration, Utc};
use sqlx::PgPool;

use crate::accounts::AccountError;
use crate::auth::token;
use crate::db;

/// Single-use, expiring reset tokens keyed to an email.
///
/// A token is active while `used = false` and `now < expires_at`. Expiry is
/// evaluated on read; nothing sweeps expired rows.
#[derive(Clone)]
pub struct ResetTokenStore {
    pool: PgPool,
}

impl ResetTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Retires every unused token for `email` and stores `token` with
    /// `expires_at = now + ttl`, as one transaction.
    pub async fn issue(&self, email: &str, token: &str, ttl: Duration) -> Result<(), AccountError> {
        let token_hash = token::hash(token);
        let expires_at = Utc::now() + ttl;

        let mut tx = self.pool.begin().await?;
        db::password_reset_tokens::lock_email(&mut *tx, email).await?;
        let retired = db::password_reset_tokens::mark_unused_as_used_for_email(&mut *tx, email).await?;
        db::password_reset_tokens::create(&mut *tx, email, &token_hash, expires_at).await?;
        tx.commit().await?;

        tracing::info!("Password reset token issued for '{email}' (retired {retired})");
        Ok(())
    }

    /// Resolves a token to its email, telling unknown tokens apart from used
    /// or expired ones.
    pub async fn check(&self, token: &str) -> Result<String, AccountError> {
        if token.is_empty() {
            return Err(AccountError::NotFound("Reset token not found.".to_string()));
        }

        let row = db::password_reset_tokens::find_by_hash(&self.pool, &token::hash(token))
            .await?
            .ok_or_else(|| AccountError::NotFound("Reset token not found.".to_string()))?;

        if row.is_active(Utc::now()) {
            Ok(row.email)
        } else {
            Err(AccountError::ExpiredOrUsed)
        }
    }

    /// The associated email while the token is active, otherwise `None`.
    pub async fn verify(&self, token: &str) -> Option<String> {
        match self.check(token).await {
            Ok(email) => Some(email),
            Err(AccountError::Store(e)) => {
                tracing::error!("Error verifying password reset token: {e}");
                None
            }
            Err(e) => {
                tracing::warn!("Password reset token rejected: {e}");
                None
            }
        }
    }

    /// Marks the token used. False when it was unknown or already used.
    pub async fn invalidate(&self, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }

        match db::password_reset_tokens::mark_used_by_hash(&self.pool, &token::hash(token)).await {
            Ok(0) => {
                tracing::warn!("Password reset token not found for invalidation");
                false
            }
            Ok(_) => {
                tracing::info!("Password reset token invalidated");
                true
            }
            Err(e) => {
                tracing::error!("Error invalidating password reset token: {e}");
                false
            }
        }
    }
}
