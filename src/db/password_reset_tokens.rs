use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::PasswordResetToken;

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    email: &str,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<PasswordResetToken, sqlx::Error> {
    sqlx::query_as::<_, PasswordResetToken>(
        "INSERT INTO password_reset_tokens (email, token_hash, expires_at)
         VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(email)
    .bind(token_hash)
    .bind(expires_at)
    .fetch_one(executor)
    .await
}

/// Serialises token issuance per email until the surrounding transaction ends.
pub async fn lock_email<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    email: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(email)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn mark_unused_as_used_for_email<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    email: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE password_reset_tokens SET used = true WHERE email = $1 AND used = false",
    )
    .bind(email)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

pub async fn find_by_hash(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<PasswordResetToken>, sqlx::Error> {
    sqlx::query_as::<_, PasswordResetToken>(
        "SELECT * FROM password_reset_tokens WHERE token_hash = $1",
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await
}

/// Flips a still-unused token to used. Returns the number of rows updated.
pub async fn mark_used_by_hash(pool: &PgPool, token_hash: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE password_reset_tokens SET used = true WHERE token_hash = $1 AND used = false",
    )
    .bind(token_hash)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn list_for_email(
    pool: &PgPool,
    email: &str,
) -> Result<Vec<PasswordResetToken>, sqlx::Error> {
    sqlx::query_as::<_, PasswordResetToken>(
        "SELECT * FROM password_reset_tokens WHERE email = $1 ORDER BY created_at ASC",
    )
    .bind(email)
    .fetch_all(pool)
    .await
}
