use anyhow::Context as _;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, instrument};

use crate::config::SmtpConfig;
use crate::domain::ports::{Email, Mailer};
use crate::error::NotificationServiceError;

/// Mailer over a pooled STARTTLS SMTP transport.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let from = config
            .from
            .parse()
            .with_context(|| format!("invalid SMTP_FROM {:?}", config.from))?;
        let credentials = Credentials::new(config.user.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .with_context(|| format!("invalid SMTP_HOST {:?}", config.host))?
            .port(config.port)
            .credentials(credentials)
            .build();
        Ok(Self { transport, from })
    }

    fn build_message(&self, email: Email) -> Result<Message, NotificationServiceError> {
        let to: Mailbox = email.to.parse().map_err(|_| {
            NotificationServiceError::InvalidInput(format!("Invalid recipient {:?}", email.to))
        })?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject)
            .multipart(MultiPart::alternative_plain_html(email.text, email.html))
            .context("build email")?;
        Ok(message)
    }
}

#[async_trait::async_trait]
impl Mailer for SmtpMailer {
    #[instrument(name = "smtp_send", skip_all, fields(subject = %email.subject))]
    async fn send(&self, email: Email) -> Result<(), NotificationServiceError> {
        let message = self.build_message(email)?;
        let response = self
            .transport
            .send(message)
            .await
            .context("smtp send")?;
        debug!(code = %response.code(), "smtp relay accepted message");
        Ok(())
    }
}
