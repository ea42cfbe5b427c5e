//! Mail extension and its SMTP transport.
//!
//! Settings come from `MAIL_*` configuration keys. The transport is built
//! once per application and shared by the mail extension and the
//! error-report sink.

use crate::config::Config;
use crate::domain::ports::mail_transport::{MailError, MailTransport};
use async_trait::async_trait;
use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, Message, SmtpTransport,
    Transport,
};
use std::sync::Arc;

/// How the SMTP session is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailSecurity {
    /// `MAIL_USE_TLS` explicitly disabled.
    PlainText,
    /// `MAIL_USE_TLS` enabled: upgrade the session with STARTTLS.
    StartTls,
    /// `MAIL_USE_TLS` never set. Delivered like `PlainText`.
    Unconfigured,
}

impl MailSecurity {
    pub fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => MailSecurity::StartTls,
            Some(false) => MailSecurity::PlainText,
            None => MailSecurity::Unconfigured,
        }
    }

    pub fn uses_starttls(&self) -> bool {
        matches!(self, MailSecurity::StartTls)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailSettings {
    pub server: String,
    pub port: u16,
    /// Username and password, present when either one was configured.
    pub credentials: Option<(String, String)>,
    pub security: MailSecurity,
}

impl MailSettings {
    /// Returns `None` when no mail server is configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        let server = config.mail_server.clone()?;

        let username = config.mail_username.clone().unwrap_or_default();
        let password = config.mail_password.clone().unwrap_or_default();
        let credentials = if !username.is_empty() || !password.is_empty() {
            Some((username, password))
        } else {
            None
        };

        Some(Self {
            server,
            port: config.mail_port,
            credentials,
            security: MailSecurity::from_flag(config.mail_use_tls),
        })
    }

    /// Sender used for automated messages: `no-reply@<mail server>`.
    pub fn no_reply_address(&self) -> String {
        format!("no-reply@{}", self.server)
    }
}

/// SMTP delivery through lettre.
pub struct SmtpMailTransport {
    mailer: SmtpTransport,
}

impl SmtpMailTransport {
    pub fn from_settings(settings: &MailSettings) -> Result<Self, MailError> {
        let builder = if settings.security.uses_starttls() {
            SmtpTransport::starttls_relay(&settings.server)?
        } else {
            SmtpTransport::builder_dangerous(&settings.server)
        };

        let builder = builder.port(settings.port);
        let builder = match &settings.credentials {
            Some((username, password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            None => builder,
        };

        Ok(Self {
            mailer: builder.build(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, message: Message) -> Result<(), MailError> {
        let mailer = self.mailer.clone();

        // lettre's SmtpTransport is blocking
        tokio::task::spawn_blocking(move || mailer.send(&message))
            .await
            .map_err(|e| MailError::Task(e.to_string()))??;

        Ok(())
    }
}

/// Application mail extension.
#[derive(Clone)]
pub struct Mail {
    settings: Option<MailSettings>,
    transport: Option<Arc<dyn MailTransport>>,
    default_sender: Option<String>,
}

impl Mail {
    pub fn new(
        settings: Option<MailSettings>,
        transport: Option<Arc<dyn MailTransport>>,
        default_sender: Option<String>,
    ) -> Self {
        Self {
            settings,
            transport,
            default_sender,
        }
    }

    /// Builds the extension from configuration. A caller-supplied transport
    /// replaces SMTP.
    pub fn from_config(
        config: &Config,
        transport: Option<Arc<dyn MailTransport>>,
    ) -> Result<Self, MailError> {
        let settings = MailSettings::from_config(config);
        let transport = match (transport, &settings) {
            (Some(transport), _) => Some(transport),
            (None, Some(settings)) => {
                Some(Arc::new(SmtpMailTransport::from_settings(settings)?) as Arc<dyn MailTransport>)
            }
            (None, None) => None,
        };

        Ok(Self::new(settings, transport, config.admins.first().cloned()))
    }

    pub fn settings(&self) -> Option<&MailSettings> {
        self.settings.as_ref()
    }

    pub fn transport(&self) -> Option<Arc<dyn MailTransport>> {
        self.transport.clone()
    }

    pub fn is_configured(&self) -> bool {
        self.settings.is_some() && self.transport.is_some()
    }

    /// Sends a plain text message from the default sender.
    pub async fn send_text(
        &self,
        to: &[String],
        subject: &str,
        body: String,
    ) -> Result<(), MailError> {
        let transport = self.transport.as_ref().ok_or(MailError::NotConfigured)?;
        let sender = self.default_sender.as_ref().ok_or(MailError::NotConfigured)?;

        let mut builder = Message::builder()
            .from(sender.parse::<Mailbox>()?)
            .subject(subject);
        for recipient in to {
            builder = builder.to(recipient.parse::<Mailbox>()?);
        }

        transport.send(builder.body(body)?).await
    }
}
