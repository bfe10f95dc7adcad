use askama::Template;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use chrono::Duration;
use serde::Deserialize;

use crate::accounts::AccountError;
use crate::auth::extractor::SESSION_COOKIE;
use crate::auth::jwt;
use crate::auth::{token, validation};
use crate::config::RegistrationMode;
use crate::error::AppError;
use crate::state::SharedState;
use crate::views::render;

const RESET_REQUESTED: &str = "If that email is registered, a reset link has been sent.";
const RESET_LINK_INVALID: &str = "This reset link is invalid or has expired. Please request a new one.";
const PASSWORDS_DIFFER: &str = "Passwords do not match.";

#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginTemplate {
    message: Option<String>,
    error: Option<String>,
    username: String,
}

#[derive(Template)]
#[template(path = "auth/register.html")]
struct RegisterTemplate {
    error: Option<String>,
    username: String,
    email: String,
    registration_open: bool,
}

#[derive(Template)]
#[template(path = "auth/forgot_password.html")]
struct ForgotPasswordTemplate {
    message: Option<String>,
    error: Option<String>,
    direct_reset: bool,
}

#[derive(Template)]
#[template(path = "auth/reset_password.html")]
struct ResetPasswordTemplate {
    token: String,
    token_valid: bool,
    error: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginQuery {
    pub message: Option<String>,
    pub error: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetQuery {
    pub token: Option<String>,
}

#[derive(Deserialize)]
pub struct ResetPasswordForm {
    pub token: String,
    pub new_password: String,
    pub confirm_new_password: String,
}

#[derive(Deserialize)]
pub struct DirectResetForm {
    pub username_or_email: String,
    pub new_password: String,
    pub confirm_new_password: String,
}

/// Only known codes are shown, so the query string cannot inject text.
fn login_notice(code: &str) -> Option<String> {
    let text = match code {
        "registration_success" => "Registration successful! Please log in.",
        "password_reset_success" => "Password reset successfully! Please log in with your new password.",
        "logged_out" => "You have been logged out.",
        "session_expired" => "Please log in to continue.",
        _ => return None,
    };
    Some(text.to_string())
}

/// Status and user-facing text for a failed account operation.
fn account_failure(err: &AccountError) -> (StatusCode, String) {
    match err {
        AccountError::Validation(_) | AccountError::ExpiredOrUsed => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        AccountError::Conflict(_) => (StatusCode::CONFLICT, err.to_string()),
        AccountError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        AccountError::Hashing(detail) => {
            tracing::error!("Password hashing failed: {detail}");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
        AccountError::Store(detail) => {
            tracing::error!("Account store error: {detail}");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(jwt::SESSION_HOURS))
        .build()
}

fn cleared_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}

pub async fn login_page(
    State(state): State<SharedState>,
    jar: CookieJar,
    Query(q): Query<LoginQuery>,
) -> Response {
    // Already signed in
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if state.sessions.verify(cookie.value()).is_ok() {
            return Redirect::to("/dashboard").into_response();
        }
    }

    let template = LoginTemplate {
        message: q.message.as_deref().and_then(login_notice),
        error: q.error.as_deref().and_then(login_notice),
        username: String::new(),
    };
    render(StatusCode::OK, &template)
}

pub async fn login(
    State(state): State<SharedState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let username = form.username.trim();

    if state.login_limiter.check(username).is_err() {
        let template = LoginTemplate {
            message: None,
            error: Some("Too many login attempts. Please try again later.".to_string()),
            username: username.to_string(),
        };
        return Ok(render(StatusCode::TOO_MANY_REQUESTS, &template));
    }

    if !state.credentials.verify(username, &form.password).await {
        state.login_limiter.record_failure(username);
        let template = LoginTemplate {
            message: None,
            error: Some("Invalid username or password".to_string()),
            username: username.to_string(),
        };
        return Ok(render(StatusCode::OK, &template));
    }
    state.login_limiter.reset(username);

    let user = state
        .credentials
        .lookup_by_username(username)
        .await?
        .ok_or_else(|| AppError::Internal(format!("User '{username}' vanished after login")))?;

    let session = state
        .sessions
        .issue(user.id, user.username)
        .map_err(AppError::Internal)?;

    let jar = CookieJar::new().add(session_cookie(session, state.config.secure_cookies()));
    Ok((jar, Redirect::to("/dashboard")).into_response())
}

pub async fn logout() -> impl IntoResponse {
    let jar = CookieJar::new().add(cleared_session_cookie());
    (jar, Redirect::to("/login?message=logged_out"))
}

pub async fn register_page(State(state): State<SharedState>) -> Response {
    let registration_open = state.config.registration == RegistrationMode::Open;
    let template = RegisterTemplate {
        error: None,
        username: String::new(),
        email: String::new(),
        registration_open,
    };
    render(StatusCode::OK, &template)
}

pub async fn register(
    State(state): State<SharedState>,
    Form(form): Form<RegisterForm>,
) -> Response {
    if state.config.registration == RegistrationMode::Closed {
        let template = RegisterTemplate {
            error: Some("Registration is disabled.".to_string()),
            username: form.username,
            email: form.email,
            registration_open: false,
        };
        return render(StatusCode::FORBIDDEN, &template);
    }

    match state
        .credentials
        .create(form.username.trim(), form.email.trim(), &form.password)
        .await
    {
        Ok(user) => {
            if let Some(mailer) = state.system_mailer.clone() {
                let login_url = format!("{}/login", state.config.base_url);
                tokio::spawn(async move {
                    if let Err(e) = mailer.send_welcome(&user.email, &user.username, &login_url).await {
                        tracing::error!("Failed to send welcome email: {e}");
                    }
                });
            }
            Redirect::to("/login?message=registration_success").into_response()
        }
        Err(e) => {
            let (status, message) = account_failure(&e);
            let template = RegisterTemplate {
                error: Some(message),
                username: form.username,
                email: form.email,
                registration_open: true,
            };
            render(status, &template)
        }
    }
}

pub async fn forgot_password_page(State(state): State<SharedState>) -> Response {
    let template = ForgotPasswordTemplate {
        message: None,
        error: None,
        direct_reset: state.config.direct_reset,
    };
    render(StatusCode::OK, &template)
}

pub async fn forgot_password(
    State(state): State<SharedState>,
    Form(form): Form<ForgotPasswordForm>,
) -> Response {
    // Same answer whether or not the email exists
    let template = ForgotPasswordTemplate {
        message: Some(RESET_REQUESTED.to_string()),
        error: None,
        direct_reset: state.config.direct_reset,
    };

    let email = form.email.trim().to_string();
    let credentials = state.credentials.clone();
    let reset_tokens = state.reset_tokens.clone();
    let mailer = state.system_mailer.clone();
    let base_url = state.config.base_url.clone();
    let ttl_mins = state.config.reset_token_ttl_mins;

    tokio::spawn(async move {
        let user = match credentials.lookup_by_email(&email).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::info!("Password reset requested for unknown email");
                return;
            }
            Err(e) => {
                tracing::error!("Password reset lookup failed: {e:?}");
                return;
            }
        };

        let token = token::generate();
        if let Err(e) = reset_tokens
            .issue(&user.email, &token, Duration::minutes(ttl_mins))
            .await
        {
            tracing::error!("Failed to issue password reset token: {e:?}");
            return;
        }

        let reset_url = format!("{base_url}/reset_password?token={token}");
        if let Some(mailer) = mailer {
            if let Err(e) = mailer
                .send_password_reset(&user.email, &reset_url, ttl_mins)
                .await
            {
                tracing::error!("Failed to send password reset email: {e}");
            }
        } else {
            tracing::warn!("System SMTP not configured. Password reset link for {}: {reset_url}", user.email);
        }
    });

    render(StatusCode::OK, &template)
}

pub async fn reset_password_page(
    State(state): State<SharedState>,
    Query(q): Query<ResetQuery>,
) -> Response {
    let token = q.token.unwrap_or_default();
    let token_valid = state.reset_tokens.verify(&token).await.is_some();

    let template = ResetPasswordTemplate {
        error: (!token_valid).then(|| RESET_LINK_INVALID.to_string()),
        token,
        token_valid,
    };
    let status = if token_valid {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    render(status, &template)
}

pub async fn reset_password(
    State(state): State<SharedState>,
    Form(form): Form<ResetPasswordForm>,
) -> Response {
    let retry = |status: StatusCode, message: &str, token_valid: bool| {
        let template = ResetPasswordTemplate {
            token: form.token.clone(),
            token_valid,
            error: Some(message.to_string()),
        };
        render(status, &template)
    };

    if form.new_password != form.confirm_new_password {
        return retry(StatusCode::BAD_REQUEST, PASSWORDS_DIFFER, true);
    }

    if let Err(msg) = validation::check_password(&form.new_password) {
        return retry(StatusCode::BAD_REQUEST, msg, true);
    }

    let email = match state.reset_tokens.check(&form.token).await {
        Ok(email) => email,
        Err(AccountError::NotFound(_) | AccountError::ExpiredOrUsed) => {
            return retry(StatusCode::BAD_REQUEST, RESET_LINK_INVALID, false);
        }
        Err(e) => {
            let (status, message) = account_failure(&e);
            return retry(status, &message, true);
        }
    };

    // Claim the token first so two submissions cannot both reset.
    if !state.reset_tokens.invalidate(&form.token).await {
        return retry(StatusCode::BAD_REQUEST, RESET_LINK_INVALID, false);
    }

    match state.credentials.update_password(&email, &form.new_password).await {
        Ok(_) => Redirect::to("/login?message=password_reset_success").into_response(),
        Err(e) => {
            let (status, message) = account_failure(&e);
            retry(status, &message, false)
        }
    }
}

pub async fn reset_password_direct(
    State(state): State<SharedState>,
    Form(form): Form<DirectResetForm>,
) -> Result<Response, AppError> {
    if !state.config.direct_reset {
        return Err(AppError::NotFound("Not found".to_string()));
    }

    let retry = |status: StatusCode, message: String| {
        let template = ForgotPasswordTemplate {
            message: None,
            error: Some(message),
            direct_reset: true,
        };
        render(status, &template)
    };

    if form.new_password != form.confirm_new_password {
        return Ok(retry(StatusCode::BAD_REQUEST, PASSWORDS_DIFFER.to_string()));
    }

    match state
        .credentials
        .update_password(form.username_or_email.trim(), &form.new_password)
        .await
    {
        Ok(_) => Ok(Redirect::to("/login?message=password_reset_success").into_response()),
        Err(e) => {
            let (status, message) = account_failure(&e);
            Ok(retry(status, message))
        }
    }
}
