pub mod templates;

use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use templates::Rendered;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid address '{0}'")]
    Address(String),
    #[error("SMTP transport: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("failed to render message: {0}")]
    Template(#[from] askama::Error),
}

/// Account mail (welcome and password reset) sent from the operator's relay.
pub struct SystemMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SystemMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|_| MailError::Address(config.from.clone()))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(Credentials::new(config.user.clone(), config.pass.clone()))
            .build();

        Ok(Self { transport, from })
    }

    pub async fn send_welcome(
        &self,
        to_email: &str,
        username: &str,
        login_url: &str,
    ) -> Result<(), MailError> {
        self.send(to_email, templates::welcome(username, login_url)?)
            .await
    }

    pub async fn send_password_reset(
        &self,
        to_email: &str,
        reset_url: &str,
        ttl_minutes: i64,
    ) -> Result<(), MailError> {
        self.send(to_email, templates::password_reset(reset_url, ttl_minutes)?)
            .await
    }

    async fn send(&self, to: &str, mail: Rendered) -> Result<(), MailError> {
        let to: Mailbox = to.parse().map_err(|_| MailError::Address(to.to_string()))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject)
            .multipart(MultiPart::alternative_plain_html(mail.text, mail.html))?;

        self.transport.send(message).await?;
        Ok(())
    }
}
