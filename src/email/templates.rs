use askama::Template;

/// Subject plus plain-text and HTML bodies of one message.
pub struct Rendered {
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[derive(Template)]
#[template(path = "email/welcome.html")]
struct WelcomeHtml<'a> {
    username: &'a str,
    login_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/welcome.txt")]
struct WelcomeText<'a> {
    username: &'a str,
    login_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetHtml<'a> {
    reset_url: &'a str,
    ttl_minutes: i64,
}

#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetText<'a> {
    reset_url: &'a str,
    ttl_minutes: i64,
}

pub fn welcome(username: &str, login_url: &str) -> Result<Rendered, askama::Error> {
    Ok(Rendered {
        subject: "Welcome to PDF Converter".to_string(),
        text: WelcomeText { username, login_url }.render()?,
        html: WelcomeHtml { username, login_url }.render()?,
    })
}

pub fn password_reset(reset_url: &str, ttl_minutes: i64) -> Result<Rendered, askama::Error> {
    Ok(Rendered {
        subject: "Password Reset - PDF Converter".to_string(),
        text: PasswordResetText { reset_url, ttl_minutes }.render()?,
        html: PasswordResetHtml { reset_url, ttl_minutes }.render()?,
    })
}
