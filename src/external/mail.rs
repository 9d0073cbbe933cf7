use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{error, info};

use super::{NotificationError, Notifier};

/// SMTP over implicit TLS, authenticated with an app password.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(host: &str, port: u16, username: &str, password: &str, from: &str) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .with_context(|| format!("invalid SMTP relay {host}"))?
            .port(port)
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .build();
        let from = from
            .parse::<Mailbox>()
            .with_context(|| format!("MAIL_FROM {from} is not a mailbox"))?;

        Ok(Self { transport, from })
    }
}

fn rejected(e: impl std::fmt::Display) -> NotificationError {
    NotificationError {
        reason: e.to_string(),
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), NotificationError> {
        let to = recipient.parse::<Mailbox>().map_err(rejected)?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(rejected)?;

        match self.transport.send(message).await {
            Ok(_) => {
                info!(recipient, subject, "Notification mail sent");
                Ok(())
            }
            Err(e) => {
                error!(recipient, error = %e, "SMTP send failed");
                Err(rejected(e))
            }
        }
    }
}
