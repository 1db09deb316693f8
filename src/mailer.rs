use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;

/// メールに添付するファイル。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MailAttachment {
    pub filename: String,
    pub content: Vec<u8>,
    pub content_type: String,
}

/// 送信するメール。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: Vec<String>,
    pub subject: String,
    pub text: String,
    pub attachment: Option<MailAttachment>,
}

/// メール送信の抽象。本番は SMTP、開発環境とテストでは別実装に差し替えます。
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<()>;
}

/// lettre を使った SMTP 送信。
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig, from: &str) -> Result<Self> {
        let builder = if config.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .context("Failed to configure SMTP relay")?;

        let mut builder = builder.port(config.port);
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from: from.parse().context("MAIL_FROM is not a valid mailbox")?,
        })
    }

    fn build_message(&self, mail: OutgoingMail) -> Result<Message> {
        let mut builder = Message::builder().from(self.from.clone()).subject(mail.subject);
        for address in &mail.to {
            builder = builder.to(address.parse().with_context(|| format!("Invalid recipient: {}", address))?);
        }

        let message = match mail.attachment {
            Some(attachment) => {
                let content_type = ContentType::parse(&attachment.content_type)
                    .context("Invalid attachment content type")?;
                builder.multipart(
                    MultiPart::mixed()
                        .singlepart(SinglePart::plain(mail.text))
                        .singlepart(Attachment::new(attachment.filename).body(attachment.content, content_type)),
                )?
            }
            None => builder.header(ContentType::TEXT_PLAIN).body(mail.text)?,
        };
        Ok(message)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        let recipients = mail.to.len();
        let message = self.build_message(mail)?;
        let response = self.transport.send(message).await.context("SMTP delivery failed")?;
        tracing::info!(recipients, code = %response.code(), "mail sent");
        Ok(())
    }
}

/// 送信せずにログへ出力するだけのメーラー (SMTP 未設定時)。
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        tracing::info!(
            to = ?mail.to,
            subject = %mail.subject,
            attachment = ?mail.attachment.as_ref().map(|a| (&a.filename, a.content.len())),
            "SMTP is not configured; mail logged instead of sent"
        );
        Ok(())
    }
}
