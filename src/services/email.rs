//! Outgoing mail
//!
//! Only used for password reset links. When no SMTP host is configured the
//! mailer is disabled and sending is a logged no-op.

use anyhow::{anyhow, Result};
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::SmtpConfig;

/// SMTP mailer built once from configuration
#[derive(Clone)]
pub struct Mailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
}

impl Mailer {
    /// Build the SMTP transport. Returns a disabled mailer when `smtp.host`
    /// is unset.
    pub fn from_config(config: &SmtpConfig) -> Result<Self> {
        let transport = match config.host.as_deref().filter(|h| !h.is_empty()) {
            Some(host) => {
                let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                    .map_err(|e| anyhow!("Failed to create SMTP transport: {}", e))?
                    .port(config.port);
                if !config.username.is_empty() {
                    builder = builder.credentials(Credentials::new(
                        config.username.clone(),
                        config.password.clone(),
                    ));
                }
                Some(builder.build())
            }
            None => None,
        };

        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }

    /// A mailer that never sends anything
    pub fn disabled() -> Self {
        Self {
            transport: None,
            from: String::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Send the password reset link to `to_email`.
    ///
    /// Returns `Ok(false)` without sending when the mailer is disabled.
    pub async fn send_reset_link(&self, to_email: &str, link: &str) -> Result<bool> {
        let Some(transport) = &self.transport else {
            tracing::debug!("SMTP not configured, reset link for {} not mailed", to_email);
            return Ok(false);
        };

        let message = reset_message(&self.from, to_email, link)?;
        transport
            .send(message)
            .await
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;

        tracing::info!("Password reset link sent to {}", to_email);
        Ok(true)
    }
}

/// Plain-text body. Lines other than the link stay short.
fn reset_body(link: &str) -> String {
    format!(
        "Hello,\n\n\
         We received a request to reset the password\n\
         for your Adria Style Studio account.\n\n\
         Open this link to choose a new password:\n\n\
         {}\n\n\
         If you did not ask for this, ignore this email.\n",
        link
    )
}

fn reset_message(from: &str, to_email: &str, link: &str) -> Result<Message> {
    Message::builder()
        .from(from.parse().map_err(|e| anyhow!("Invalid from address: {}", e))?)
        .to(to_email
            .parse()
            .map_err(|e| anyhow!("Invalid to address: {}", e))?)
        .subject("Reset your Adria Style Studio password")
        .header(ContentType::TEXT_PLAIN)
        .body(reset_body(link))
        .map_err(|e| anyhow!("Failed to build email: {}", e))
}
