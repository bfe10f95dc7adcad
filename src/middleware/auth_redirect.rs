use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum::extract::Request;

/// Sends browsers to the login page instead of showing a 401 JSON body.
pub async fn redirect_unauthorized(req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    if response.status() == StatusCode::UNAUTHORIZED {
        Redirect::to("/login?error=session_expired").into_response()
    } else {
        response
    }
}
