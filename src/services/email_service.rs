use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::errors::{AppError, Result};
use crate::models::insight::InsightNotice;

const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct Recipient {
    pub email: String,
    pub name: Option<String>,
}

impl Recipient {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            email: email.into(),
            name: (!name.trim().is_empty()).then_some(name),
        }
    }

    fn greeting(&self) -> String {
        match &self.name {
            Some(name) => format!("Hello {},", name),
            None => "Hello,".to_string(),
        }
    }
}

/// Transactional email delivery.
///
/// Callers dispatch these from spawned tasks; a failed send is logged and
/// never changes the outcome of the request that triggered it.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_otp(&self, to: &Recipient, otp: &str, valid_for: Duration) -> Result<()>;

    async fn send_password_reset_confirmation(&self, to: &Recipient) -> Result<()>;

    async fn send_insight_notification(&self, to: &str, insight: &InsightNotice) -> Result<()>;
}

pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    brand: String,
}

impl SmtpNotifier {
    pub fn new(smtp: &SmtpConfig, from_email: &str, from_name: &str) -> Result<Self> {
        let builder = if smtp.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
        }
        .map_err(|e| AppError::email(format!("SMTP relay error: {}", e)))?;

        let transport = builder
            .port(smtp.port)
            .credentials(Credentials::new(smtp.username.clone(), smtp.password.clone()))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        let address: Address = from_email
            .parse()
            .map_err(|e| AppError::configuration(format!("MAIL_FROM is not an address: {}", e)))?;

        Ok(Self {
            transport,
            from: Mailbox::new(Some(from_name.to_string()), address),
            brand: from_name.to_string(),
        })
    }

    async fn send_html(&self, to: Mailbox, subject: &str, html: String) -> Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)
            .map_err(|e| AppError::email(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::email(format!("SMTP send failed: {}", e)))?;

        Ok(())
    }
}

fn mailbox(to: &Recipient) -> Result<Mailbox> {
    let address: Address = to
        .email
        .parse()
        .map_err(|e| AppError::email(format!("Invalid recipient {}: {}", to.email, e)))?;
    Ok(Mailbox::new(to.name.clone(), address))
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_otp(&self, to: &Recipient, otp: &str, valid_for: Duration) -> Result<()> {
        let subject = format!("Password Reset OTP - {}", self.brand);
        let html = otp_email(to, otp, valid_for, &self.brand);
        self.send_html(mailbox(to)?, &subject, html).await
    }

    async fn send_password_reset_confirmation(&self, to: &Recipient) -> Result<()> {
        let subject = format!("Password Reset Successful - {}", self.brand);
        let html = reset_confirmation_email(to, &self.brand);
        self.send_html(mailbox(to)?, &subject, html).await
    }

    async fn send_insight_notification(&self, to: &str, insight: &InsightNotice) -> Result<()> {
        let subject = format!("New Insight: {}", insight.title);
        let html = insight_email(insight, &self.brand);
        self.send_html(mailbox(&Recipient::new(to, ""))?, &subject, html).await
    }
}

/// Writes emails to the log instead of sending them.
///
/// Used when no SMTP server is configured, e.g. local development.
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send_otp(&self, to: &Recipient, otp: &str, valid_for: Duration) -> Result<()> {
        tracing::info!(
            to = %to.email,
            valid_for_secs = valid_for.as_secs(),
            "[console email] password reset OTP: {}",
            otp
        );
        Ok(())
    }

    async fn send_password_reset_confirmation(&self, to: &Recipient) -> Result<()> {
        tracing::info!(to = %to.email, "[console email] password reset confirmation");
        Ok(())
    }

    async fn send_insight_notification(&self, to: &str, insight: &InsightNotice) -> Result<()> {
        tracing::info!(to = %to, link = %insight.link, "[console email] new insight: {}", insight.title);
        Ok(())
    }
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn otp_email(to: &Recipient, otp: &str, valid_for: Duration, brand: &str) -> String {
    let minutes = (valid_for.as_secs() / 60).max(1);
    format!(
        r#"
<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px; border: 1px solid #e0e0e0; border-radius: 8px;">
    <h1 style="color: #0ea5e9; text-align: center;">Password Reset Request</h1>
    <p style="font-size: 16px; color: #333;">{greeting}</p>
    <p style="font-size: 16px; color: #333; line-height: 1.5;">
        We received a request to reset your password. Use the following One-Time Password (OTP) to continue:
    </p>
    <div style="background-color: #f8fafc; border: 2px dashed #0ea5e9; border-radius: 8px; padding: 20px; text-align: center; margin: 30px 0;">
        <h2 style="color: #0ea5e9; font-size: 32px; letter-spacing: 4px; margin: 0; font-family: 'Courier New', monospace;">{otp}</h2>
        <p style="color: #64748b; font-size: 14px; margin: 10px 0 0 0;">This OTP is valid for {minutes} minutes</p>
    </div>
    <p style="color: #856404; font-size: 14px;">
        <strong>Security Notice:</strong> If you didn't request this password reset, please ignore this email. Your password will remain unchanged.
    </p>
    <p style="font-size: 14px; color: #64748b; text-align: center;">Best regards,<br/><strong>{brand} Team</strong></p>
</div>
"#,
        greeting = escape_html(&to.greeting()),
        otp = otp,
        minutes = minutes,
        brand = escape_html(brand),
    )
}

fn reset_confirmation_email(to: &Recipient, brand: &str) -> String {
    let when = Utc::now().format("%B %-d, %Y %H:%M UTC");
    format!(
        r#"
<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px; border: 1px solid #e0e0e0; border-radius: 8px;">
    <h1 style="color: #10b981; text-align: center;">Password Reset Successful</h1>
    <p style="font-size: 16px; color: #333;">{greeting}</p>
    <p style="font-size: 16px; color: #333; line-height: 1.5;">
        Your password was changed on {when}. You can now sign in with your new password.
    </p>
    <p style="color: #991b1b; font-size: 14px;">
        If you did not make this change, contact our support team immediately.
    </p>
    <p style="font-size: 14px; color: #64748b; text-align: center;">Best regards,<br/><strong>{brand} Team</strong></p>
</div>
"#,
        greeting = escape_html(&to.greeting()),
        when = when,
        brand = escape_html(brand),
    )
}

fn insight_email(insight: &InsightNotice, brand: &str) -> String {
    format!(
        r#"
<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2 style="color: #0ea5e9;">{title}</h2>
    <p style="font-size: 15px; color: #333; line-height: 1.5;">{preview}&hellip;</p>
    <p style="margin: 30px 0;">
        <a href="{link}" style="display: inline-block; background-color: #0ea5e9; color: white; padding: 12px 24px; text-decoration: none; border-radius: 4px;">Read more</a>
    </p>
    <p style="font-size: 12px; color: #64748b;">You are receiving this because you subscribed to {brand} insights.</p>
</div>
"#,
        title = escape_html(&insight.title),
        preview = escape_html(&insight.preview),
        link = escape_html(&insight.link),
        brand = escape_html(brand),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipient_without_name_gets_plain_greeting() {
        assert_eq!(Recipient::new("a@x.com", "  ").greeting(), "Hello,");
        assert_eq!(Recipient::new("a@x.com", "Ada").greeting(), "Hello Ada,");
    }

    #[test]
    fn otp_email_shows_code_and_validity() {
        let html = otp_email(&Recipient::new("a@x.com", "Ada"), "45213", Duration::from_secs(300), "ONCG");
        assert!(html.contains("45213"));
        assert!(html.contains("valid for 5 minutes"));
    }

    #[test]
    fn insight_email_escapes_user_content() {
        let notice = InsightNotice {
            title: "<script>alert(1)</script>".to_string(),
            preview: "Tom & Jerry".to_string(),
            link: "https://oncg.com/insights/1".to_string(),
        };
        let html = insight_email(&notice, "ONCG");
        assert!(!html.contains("<script>"));
        assert!(html.contains("Tom &amp; Jerry"));
    }

    #[test]
    fn smtp_notifier_rejects_bad_sender() {
        let smtp = SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: "user".to_string(),
            password: "pass".to_string(),
        };
        assert!(SmtpNotifier::new(&smtp, "not an address", "ONCG").is_err());
    }
}
