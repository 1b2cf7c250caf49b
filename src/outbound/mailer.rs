use async_trait::async_trait;
use tracing::info;

use crate::config::MailConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Mail transport failed: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<(), MailError>;
}

/// Writes outgoing mail to the log instead of a transport
#[derive(Debug, Clone)]
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(config: &MailConfig) -> Self {
        Self {
            from: format!("{} <{}>", config.from_name, config.from_email),
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> Result<(), MailError> {
        info!(from = %self.from, to = %email.to, subject = %email.subject, body = %email.body, "outgoing mail");
        Ok(())
    }
}
