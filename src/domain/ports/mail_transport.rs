use async_trait::async_trait;
use lettre::Message;

/// Outgoing mail delivery.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: Message) -> Result<(), MailError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Mail is not configured")]
    NotConfigured,

    #[error("Invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build email: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("Mail delivery task failed: {0}")]
    Task(String),

    #[error("SMTP delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}
