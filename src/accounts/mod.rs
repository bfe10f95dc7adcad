//! Credential and reset-token lifecycle.
//!
//! Both stores own a clone of the connection pool and persist every operation
//! synchronously. Driver errors are wrapped in [`AccountError::Store`]. Its
//! message never carries driver detail; the underlying error is its
//! `source()`.

pub mod credentials;
pub mod reset_tokens;

pub use credentials::CredentialStore;
pub use reset_tokens::ResetTokenStore;

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Reset token is invalid or has expired.")]
    ExpiredOrUsed,
    #[error("Password could not be processed.")]
    Hashing(String),
    #[error("A storage error occurred. Please try again later.")]
    Store(#[source] sqlx::Error),
}

impl From<sqlx::Error> for AccountError {
    fn from(err: sqlx::Error) -> Self {
        AccountError::Store(err)
    }
}
