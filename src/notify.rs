//! Notification delivery: one message plus optional file attachments to a
//! fixed recipient.
//!
//! Production implementation hands the message to an SMTP relay (lettre,
//! blocking transport, plain SMTP — the relay is expected to be local or
//! otherwise trusted). The trait keeps the watcher testable without a
//! transport.

use lettre::message::header::ContentType;
use lettre::message::{Attachment as MailAttachment, Mailbox, MultiPart, SinglePart};
use lettre::{Message, SmtpTransport, Transport};

use crate::config::WatcherConfig;
use crate::error::SendError;

/// One mail attachment: filename as shown to the recipient + raw body.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub body: Vec<u8>,
}

/// Delivers a message to the configured recipient.
pub trait Notifier {
    fn send(&self, message: &str, attachments: &[Attachment]) -> Result<(), SendError>;
}

/// SMTP notifier with fixed sender/recipient/subject.
pub struct SmtpNotifier {
    sender: String,
    recipient: String,
    subject: String,
    transport: SmtpTransport,
}

impl SmtpNotifier {
    pub fn new(relay: &str, port: u16, sender: &str, recipient: &str, subject: &str) -> Self {
        let transport = SmtpTransport::builder_dangerous(relay).port(port).build();
        Self {
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            transport,
        }
    }

    pub fn from_config(cfg: &WatcherConfig) -> Self {
        Self::new(
            &cfg.smtp_relay,
            cfg.smtp_port,
            &cfg.notification_sender,
            &cfg.notification_recipient,
            &cfg.notification_subject,
        )
    }

    fn mailbox(addr: &str) -> Result<Mailbox, SendError> {
        addr.parse()
            .map_err(|_| SendError::Address(addr.to_string()))
    }
}

impl Notifier for SmtpNotifier {
    fn send(&self, message: &str, attachments: &[Attachment]) -> Result<(), SendError> {
        let from = Self::mailbox(&self.sender)?;
        let to = Self::mailbox(&self.recipient)?;

        let mut body = MultiPart::mixed().singlepart(SinglePart::plain(message.to_string()));
        for attachment in attachments {
            let content_type = ContentType::parse("application/octet-stream")
                .map_err(|e| SendError::Compose(e.to_string()))?;
            body = body.singlepart(
                MailAttachment::new(attachment.filename.clone())
                    .body(attachment.body.clone(), content_type),
            );
        }

        let mail = Message::builder()
            .from(from)
            .to(to)
            .subject(self.subject.clone())
            .multipart(body)
            .map_err(|e| SendError::Compose(e.to_string()))?;

        self.transport
            .send(&mail)
            .map(|_| ())
            .map_err(|e| SendError::Transport(e.to_string()))
    }
}
