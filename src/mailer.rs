//! Outbound alert delivery over SMTP.
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::fmt;
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("recipient list must be non-empty")]
    NoRecipients,
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Seam for the mail transport so cycles can record dispatches in tests.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Exactly one transmission attempt addressed to the full recipient list.
    async fn send(
        &self,
        subject: &str,
        body: &str,
        recipients: &[String],
    ) -> Result<(), DeliveryError>;
}

#[derive(Clone)]
pub struct SmtpMailer {
    host: String,
    port: u16,
    from: String,
    password: String,
}

impl fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("from", &self.from)
            .finish_non_exhaustive()
    }
}

impl SmtpMailer {
    /// `from` is both the sender address and the SMTP login.
    pub fn new(host: String, port: u16, from: String, password: String) -> Self {
        Self {
            host,
            port,
            from,
            password,
        }
    }

    fn build_message(
        &self,
        subject: &str,
        body: &str,
        recipients: &[String],
    ) -> Result<Message, DeliveryError> {
        if recipients.is_empty() {
            return Err(DeliveryError::NoRecipients);
        }
        let from: Mailbox = self.from.parse()?;
        let mut builder = Message::builder().from(from).subject(subject);
        for recipient in recipients {
            builder = builder.to(recipient.parse::<Mailbox>()?);
        }
        Ok(builder.body(body.to_string())?)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    /// One session per dispatch: STARTTLS, authenticate as the sender, submit
    /// one message to every recipient at once, drop the transport.
    #[instrument(skip_all)]
    async fn send(
        &self,
        subject: &str,
        body: &str,
        recipients: &[String],
    ) -> Result<(), DeliveryError> {
        let message = self.build_message(subject, body, recipients)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)?
            .port(self.port)
            .credentials(Credentials::new(self.from.clone(), self.password.clone()))
            .build();
        transport.send(message).await?;

        info!(recipients = recipients.len(), "alert dispatched");
        Ok(())
    }
}
