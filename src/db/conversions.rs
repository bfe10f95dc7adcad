use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Conversion, ConversionStatus};

pub async fn create(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
    original_filename: &str,
) -> Result<Conversion, sqlx::Error> {
    sqlx::query_as::<_, Conversion>(
        "INSERT INTO conversions (id, user_id, original_filename, status)
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .bind(original_filename)
    .bind(ConversionStatus::Processing.as_str())
    .fetch_one(pool)
    .await
}

pub async fn set_status(
    pool: &PgPool,
    id: Uuid,
    status: ConversionStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE conversions SET status = $2 WHERE id = $1")
        .bind(id)
        .bind(status.as_str())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn find_for_user(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<Conversion>, sqlx::Error> {
    sqlx::query_as::<_, Conversion>("SELECT * FROM conversions WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_by_user(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<Conversion>, sqlx::Error> {
    sqlx::query_as::<_, Conversion>(
        "SELECT * FROM conversions WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}
