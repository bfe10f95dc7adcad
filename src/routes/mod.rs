pub mod convert;
pub mod conversions;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes(max_upload_size: usize) -> Router<SharedState> {
    Router::new()
        .route(
            "/convert",
            post(convert::convert).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/download/{file_id}", get(convert::download))
        .route("/api/v1/conversions", get(conversions::list))
}
