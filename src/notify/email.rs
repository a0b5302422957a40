use anyhow::{Context, Result};
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::{Notifier, QuakeAlert};

pub struct EmailSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailSender {
    /// `Ok(None)` when the SMTP variables are not all set.
    pub fn from_env() -> Result<Option<Self>> {
        let vars = [
            "SMTP_HOST",
            "SMTP_USER",
            "SMTP_PASS",
            "NOTIFY_EMAIL_FROM",
            "NOTIFY_EMAIL_TO",
        ]
        .map(|k| std::env::var(k).ok());
        let [Some(host), Some(user), Some(pass), Some(from_addr), Some(to_addr)] = vars else {
            return Ok(None);
        };

        let creds = Credentials::new(user, pass);
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
            .context("invalid SMTP_HOST")?
            .credentials(creds)
            .build();

        let from = from_addr.parse::<Mailbox>().context("invalid NOTIFY_EMAIL_FROM")?;
        let to = to_addr.parse::<Mailbox>().context("invalid NOTIFY_EMAIL_TO")?;

        Ok(Some(Self { mailer, from, to }))
    }
}

#[async_trait::async_trait]
impl Notifier for EmailSender {
    async fn send(&self, alert: &QuakeAlert) -> Result<()> {
        let r = &alert.record;
        let body = format!(
            "{}\nTarih: {} {}\nEnlem/Boylam: {:.4}, {:.4}\nAlgılandı: {}\n",
            alert.body(),
            r.date,
            r.time,
            r.latitude,
            r.longitude,
            alert.ts.to_rfc3339()
        );

        let msg = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(alert.title())
            .header(header::ContentType::TEXT_PLAIN)
            .body(body)
            .context("build email")?;

        self.mailer.send(msg).await.context("send email")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "email"
    }
}
