use axum::extract::State;
use axum::Json;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::Conversion;
use crate::state::SharedState;

const HISTORY_LIMIT: i64 = 50;

pub async fn list(
    State(state): State<SharedState>,
    auth: AuthUser,
) -> Result<Json<Vec<Conversion>>, AppError> {
    let conversions = db::conversions::list_by_user(&state.pool, auth.user_id, HISTORY_LIMIT).await?;
    Ok(Json(conversions))
}
