use anyhow::Context;
use async_trait::async_trait;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::application::ports::mailer::{Mailer, OutgoingEmail};
use crate::bootstrap::config::SmtpConfig;

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// `secure` selects implicit TLS (usually port 465); otherwise STARTTLS is used when offered.
    pub fn new(cfg: &SmtpConfig) -> anyhow::Result<Self> {
        let from = cfg
            .from
            .parse::<Mailbox>()
            .map_err(|e| anyhow::anyhow!("invalid SMTP_FROM: {}", e))?;
        let tls_params = TlsParameters::new(cfg.host.clone())?;
        let tls = if cfg.secure {
            Tls::Wrapper(tls_params)
        } else {
            Tls::Opportunistic(tls_params)
        };
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(cfg.host.as_str())
            .port(cfg.port)
            .tls(tls)
            .credentials(Credentials::new(cfg.user.clone(), cfg.pass.clone()))
            .build();
        Ok(Self { transport, from })
    }
}

pub fn build_message(from: &Mailbox, email: &OutgoingEmail) -> anyhow::Result<Message> {
    let to = email
        .to
        .parse::<Mailbox>()
        .map_err(|e| anyhow::anyhow!("invalid recipient {}: {}", email.to, e))?;
    let message = Message::builder()
        .from(from.clone())
        .to(to)
        .subject(email.subject.clone())
        .header(ContentType::TEXT_PLAIN)
        .body(email.text.clone())?;
    Ok(message)
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()> {
        let message = build_message(&self.from, &email)?;
        self.transport
            .send(message)
            .await
            .with_context(|| format!("smtp send failed: {}", email.subject))?;
        tracing::debug!(subject = %email.subject, "email_sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_plain_text_message() {
        let from: Mailbox = "App <noreply@example.com>".parse().unwrap();
        let email = OutgoingEmail {
            to: "jane@example.com".into(),
            subject: "Verify your email".into(),
            text: "Click the link to verify your email: https://x".into(),
        };
        let raw = String::from_utf8(build_message(&from, &email).unwrap().formatted()).unwrap();
        assert!(raw.contains("Subject: Verify your email"));
        assert!(raw.contains("To: jane@example.com"));
        assert!(raw.contains("text/plain"));
    }

    #[test]
    fn rejects_bad_recipient() {
        let from: Mailbox = "noreply@example.com".parse().unwrap();
        let email = OutgoingEmail {
            to: "nobody".into(),
            subject: "s".into(),
            text: "t".into(),
        };
        assert!(build_message(&from, &email).is_err());
    }
}
