pub mod auth;
pub mod dashboard;

use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::state::SharedState;

/// Pages that need a signed-in user. A 401 from these is turned into a
/// redirect to the login page.
pub fn protected_routes() -> Router<SharedState> {
    Router::new().route("/dashboard", get(dashboard::index))
}

pub fn view_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(auth::login_page))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/register", get(auth::register_page).post(auth::register))
        .route(
            "/forgot_password",
            get(auth::forgot_password_page).post(auth::forgot_password),
        )
        .route(
            "/reset_password",
            get(auth::reset_password_page).post(auth::reset_password),
        )
        .route("/reset_password_direct", post(auth::reset_password_direct))
}

pub(crate) fn render<T: Template>(status: StatusCode, template: &T) -> Response {
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Template render failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}
