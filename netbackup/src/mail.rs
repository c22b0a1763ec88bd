//! Report delivery over SMTP.

use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use log::info;
use secrecy::{ExposeSecret, SecretString};

use crate::error::{MailError, SecretsError};
use crate::secrets::SecretStore;

/// Shown by mail clients that cannot render the HTML part.
pub const PLAIN_FALLBACK: &str = "Please enable HTML e-mail support to view this message.";

/// SMTP relay settings from the secrets file.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from: String,
    /// One or more recipients, comma separated in the secrets file.
    pub to: Vec<String>,
}

impl SmtpSettings {
    /// `None` unless `USE_SMTP=yes`.
    pub fn from_secrets(secrets: &SecretStore) -> Result<Option<Self>, SecretsError> {
        if secrets.value("USE_SMTP") != Some("yes") {
            return Ok(None);
        }

        let port = secrets.require_value("SMTP_PORT")?;
        let port = port.trim().parse().map_err(|_| SecretsError::Invalid {
            key: "SMTP_PORT".to_string(),
            message: format!("'{port}' is not a port number"),
        })?;

        let to = secrets
            .require_value("SMTP_TO")?
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect::<Vec<_>>();
        if to.is_empty() {
            return Err(SecretsError::Invalid {
                key: "SMTP_TO".to_string(),
                message: "no recipients".to_string(),
            });
        }

        Ok(Some(Self {
            host: secrets.require_value("SMTP_HOST")?.to_string(),
            port,
            username: secrets.require_value("SMTP_USER")?.to_string(),
            password: secrets.require("SMTP_PASS")?.clone(),
            from: secrets.require_value("SMTP_FROM")?.to_string(),
            to,
        }))
    }
}

/// Subject line for a run's report.
pub fn subject(org: &str, date: &str) -> String {
    format!("Netbackup report for {org} at {date}")
}

/// Multipart/alternative message: plain fallback, then the HTML report.
pub fn build_message(settings: &SmtpSettings, subject: &str, html: String) -> Result<Message, MailError> {
    let mailbox = |address: &str| {
        address
            .parse::<Mailbox>()
            .map_err(|e| MailError::Message(format!("invalid address '{address}': {e}")))
    };

    let mut builder = Message::builder()
        .from(mailbox(&settings.from)?)
        .subject(subject);
    for to in &settings.to {
        builder = builder.to(mailbox(to)?);
    }

    builder
        .multipart(MultiPart::alternative_plain_html(
            PLAIN_FALLBACK.to_string(),
            html,
        ))
        .map_err(|e| MailError::Message(e.to_string()))
}

/// Send the rendered report through the relay with STARTTLS and login.
pub async fn send_report(settings: &SmtpSettings, subject: &str, html: String) -> Result<(), MailError> {
    let message = build_message(settings, subject, html)?;

    let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
        .port(settings.port)
        .credentials(Credentials::new(
            settings.username.clone(),
            settings.password.expose_secret().to_string(),
        ))
        .build();

    transport.send(message).await?;
    info!(
        "report mailed to {} via {}:{}",
        settings.to.join(", "),
        settings.host,
        settings.port
    );
    Ok(())
}
