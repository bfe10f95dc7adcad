use regex::Regex;
use std::sync::LazyLock;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 8;

/// Characters that satisfy the special-character rule.
pub const SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

pub const USERNAME_MESSAGE: &str = "Username must be at least 3 characters long.";
pub const EMAIL_MESSAGE: &str = "Invalid email format.";
pub const PASSWORD_MESSAGE: &str = "Password must be at least 8 characters, include uppercase, lowercase, digit, and special character.";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap()
});

pub fn is_valid_username(username: &str) -> bool {
    username.chars().count() >= MIN_USERNAME_LEN
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| SPECIAL_CHARS.contains(c))
}

/// Checks a registration triple, reporting the first rule broken.
pub fn check_registration(username: &str, email: &str, password: &str) -> Result<(), &'static str> {
    if !is_valid_username(username) {
        tracing::warn!("Validation failed: username too short");
        return Err(USERNAME_MESSAGE);
    }
    if !is_valid_email(email) {
        tracing::warn!("Validation failed: invalid email format");
        return Err(EMAIL_MESSAGE);
    }
    check_password(password)
}

pub fn check_password(password: &str) -> Result<(), &'static str> {
    if !is_strong_password(password) {
        tracing::warn!("Validation failed: weak password");
        return Err(PASSWORD_MESSAGE);
    }
    Ok(())
}
