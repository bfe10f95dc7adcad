use askama::Template;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::state::SharedState;
use crate::views::render;

#[derive(Template)]
#[template(path = "dashboard/index.html")]
struct DashboardTemplate {
    username: String,
    max_upload_mb: usize,
    conversions: Vec<ConversionRow>,
}

struct ConversionRow {
    id: String,
    original_filename: String,
    status: String,
    created_at: String,
    downloadable: bool,
}

pub async fn index(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Response, AppError> {
    let conversions = db::conversions::list_by_user(&state.pool, auth.user_id, 50)
        .await?
        .into_iter()
        .map(|c| ConversionRow {
            downloadable: c.is_completed(),
            id: c.id.to_string(),
            original_filename: c.original_filename,
            status: c.status,
            created_at: c.created_at.format("%Y-%m-%d %H:%M").to_string(),
        })
        .collect();

    let template = DashboardTemplate {
        username: auth.username,
        max_upload_mb: state.config.max_upload_size / (1024 * 1024),
        conversions,
    };
    Ok(render(StatusCode::OK, &template))
}
