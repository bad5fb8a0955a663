//! SMTP delivery of the report email.
//!
//! Real counterpart of the dry-run transport: builds the message with
//! the CSV attached and hands it to the configured SMTP relay. Success
//! or failure is a single atomic outcome as far as the run is
//! concerned.

use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use radar_common::config::SmtpConfig;
use radar_common::transport::CSV_ATTACHMENT_NAME;
use radar_common::{NotificationTransport, OutboundReport, RelayError};

const SEND_TIMEOUT_SECS: u64 = 30;

#[derive(Debug)]
pub struct SmtpMailer {
    config: SmtpConfig,
    host: String,
    recipient: String,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Result<Self, RelayError> {
        let host = config
            .host
            .clone()
            .ok_or_else(|| RelayError::Config("smtp.host not configured".to_string()))?;
        let recipient = config
            .recipient
            .clone()
            .ok_or_else(|| RelayError::Config("smtp.recipient not configured".to_string()))?;
        Ok(Self {
            config,
            host,
            recipient,
        })
    }

    fn build_message(&self, report: &OutboundReport) -> Result<Message, RelayError> {
        let from = self
            .config
            .effective_from()
            .parse()
            .map_err(|e| RelayError::Config(format!("invalid from address: {e}")))?;
        let to = self
            .recipient
            .parse()
            .map_err(|e| RelayError::Config(format!("invalid recipient address: {e}")))?;
        let csv_type = ContentType::parse("text/csv")
            .map_err(|e| RelayError::Delivery(format!("attachment content type: {e}")))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(&report.subject)
            .multipart(
                MultiPart::mixed()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(report.body.clone()),
                    )
                    .singlepart(
                        Attachment::new(CSV_ATTACHMENT_NAME.to_string())
                            .body(report.csv.clone(), csv_type),
                    ),
            )
            .map_err(|e| RelayError::Delivery(format!("message build: {e}")))
    }

    fn build_transport(&self) -> Result<SmtpTransport, RelayError> {
        let builder = if self.config.use_ssl {
            SmtpTransport::relay(&self.host)
                .map_err(|e| RelayError::Delivery(format!("smtp relay {}: {e}", self.host)))?
        } else if self.config.use_starttls {
            SmtpTransport::starttls_relay(&self.host)
                .map_err(|e| RelayError::Delivery(format!("smtp starttls {}: {e}", self.host)))?
        } else {
            SmtpTransport::builder_dangerous(&self.host)
        };

        let mut builder = builder
            .port(self.config.port)
            .timeout(Some(Duration::from_secs(SEND_TIMEOUT_SECS)));
        if !self.config.user.is_empty() {
            builder = builder.credentials(Credentials::new(
                self.config.user.clone(),
                self.config.pass.clone(),
            ));
        }
        Ok(builder.build())
    }
}

impl NotificationTransport for SmtpMailer {
    fn send(&self, report: &OutboundReport) -> Result<(), RelayError> {
        let message = self.build_message(report)?;
        let transport = self.build_transport()?;
        transport
            .send(&message)
            .map_err(|e| RelayError::Delivery(format!("smtp send: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radar_common::RunMode;

    fn config() -> SmtpConfig {
        SmtpConfig {
            host: Some("mail.example.com".to_string()),
            recipient: Some("reports@example.com".to_string()),
            user: "relay@example.com".to_string(),
            ..SmtpConfig::default()
        }
    }

    fn report() -> OutboundReport {
        OutboundReport {
            subject: "Backup Report CSV - FULL - 2023-11-15T09:00:00Z".to_string(),
            body: "Attached CSV (FULL) generated at 2023-11-15T09:00:00Z.".to_string(),
            mode: RunMode::Full,
            csv: "Device,Status,Backup Date,Client,Job\r\n".to_string(),
            row_count: 0,
        }
    }

    #[test]
    fn missing_host_or_recipient_is_config_error() {
        let mut c = config();
        c.host = None;
        assert!(matches!(
            SmtpMailer::new(c).unwrap_err(),
            RelayError::Config(_)
        ));

        let mut c = config();
        c.recipient = None;
        assert!(matches!(
            SmtpMailer::new(c).unwrap_err(),
            RelayError::Config(_)
        ));
    }

    #[test]
    fn message_builds_with_csv_attachment() {
        let mailer = SmtpMailer::new(config()).unwrap();
        let message = mailer.build_message(&report()).unwrap();
        let rendered = String::from_utf8(message.formatted()).unwrap();
        assert!(rendered.contains("Subject: Backup Report CSV - FULL - 2023-11-15T09:00:00Z"));
        assert!(rendered.contains("current_assets.csv"));
        assert!(rendered.contains("To: reports@example.com"));
        assert!(rendered.contains("From: relay@example.com"));
    }

    #[test]
    fn invalid_recipient_is_config_error() {
        let mut c = config();
        c.recipient = Some("not an address".to_string());
        let mailer = SmtpMailer::new(c).unwrap();
        assert!(matches!(
            mailer.build_message(&report()).unwrap_err(),
            RelayError::Config(_)
        ));
    }
}
