use std::sync::Arc;

use sqlx::PgPool;

use crate::accounts::{CredentialStore, ResetTokenStore};
use crate::auth::jwt::SessionKeys;
use crate::config::Config;
use crate::convert::Converter;
use crate::email::SystemMailer;
use crate::rate_limit::LoginRateLimiter;
use crate::storage::SharedStorage;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub sessions: SessionKeys,
    pub credentials: CredentialStore,
    pub reset_tokens: ResetTokenStore,
    pub converter: Converter,
    pub storage: SharedStorage,
    pub system_mailer: Option<Arc<SystemMailer>>,
    pub login_limiter: LoginRateLimiter,
}
