//! SMTP notification fan-out.
//!
//! One authenticated STARTTLS session per fan-out, shared across the
//! recipient list. A recipient that fails never blocks the rest; the
//! aggregate outcome carries who succeeded and who did not. Missing
//! credentials short-circuit before any network traffic.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message as LettreMessage, Tokio1Executor};

use seatwatch_core::config::MailConfig;
use seatwatch_core::error::{Result, SeatwatchError};
use seatwatch_core::traits::Notifier;
use seatwatch_core::types::{DeliveryFailure, NotificationOutcome, NotificationRequest};

/// Email notifier backed by lettre's async SMTP transport.
pub struct Mailer {
    config: MailConfig,
}

impl Mailer {
    pub fn new(config: MailConfig) -> Self {
        Self { config }
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let creds = Credentials::new(self.config.username.clone(), self.config.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)
            .map_err(|e| SeatwatchError::Notify(format!("SMTP relay: {e}")))?
            .port(self.config.smtp_port)
            .credentials(creds)
            .build();
        Ok(mailer)
    }

    fn from_mailbox(&self) -> Result<Mailbox> {
        let from_name = self.config.display_name.as_deref().unwrap_or("Seatwatch");
        format!("{from_name} <{}>", self.config.username)
            .parse()
            .map_err(|e| SeatwatchError::Notify(format!("Invalid from address: {e}")))
    }

    async fn send_one(
        &self,
        mailer: &AsyncSmtpTransport<Tokio1Executor>,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<()> {
        let to_mailbox: Mailbox = to
            .parse()
            .map_err(|e| SeatwatchError::Notify(format!("Invalid to address: {e}")))?;

        let email = LettreMessage::builder()
            .from(self.from_mailbox()?)
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| SeatwatchError::Notify(format!("Build email: {e}")))?;

        mailer
            .send(email)
            .await
            .map_err(|e| SeatwatchError::Notify(format!("SMTP send: {e}")))?;

        Ok(())
    }
}

/// Attempt delivery to every recipient in order, isolating each failure.
///
/// Generic over the per-recipient send so the aggregation semantics are
/// testable without a live transport.
pub async fn deliver_each<F, Fut>(recipients: &[String], send: F) -> NotificationOutcome
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let mut sent = 0;
    let mut failed = Vec::new();

    for recipient in recipients {
        match send(recipient.clone()).await {
            Ok(()) => {
                tracing::info!("notification delivered to {recipient}");
                sent += 1;
            }
            Err(e) => {
                tracing::warn!("delivery to {recipient} failed: {e}");
                failed.push(DeliveryFailure {
                    recipient: recipient.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    NotificationOutcome::Delivered { sent, failed }
}

#[async_trait]
impl Notifier for Mailer {
    async fn notify(&self, request: &NotificationRequest) -> NotificationOutcome {
        if self.config.username.is_empty() || self.config.password.is_empty() {
            return NotificationOutcome::ConfigError(
                "SMTP credentials not configured (mail.username / mail.password)".into(),
            );
        }

        let mailer = match self.transport() {
            Ok(m) => m,
            Err(e) => return NotificationOutcome::ConfigError(e.to_string()),
        };

        deliver_each(&request.recipients, |recipient| {
            let mailer = &mailer;
            async move {
                self.send_one(mailer, &recipient, &request.subject, &request.body)
                    .await
            }
        })
        .await
    }
}
