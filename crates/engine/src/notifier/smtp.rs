use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::channel::{ChannelDeliveryError, Notifier};
use crate::alert::{AlertEvent, ChannelKind};

pub struct EmailNotifier {
    from: Mailbox,
    to: Vec<Mailbox>,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailNotifier {
    pub fn new(
        host: &str,
        port: u16,
        username: &str,
        password: &str,
        from: &str,
        to: &[String],
    ) -> Result<Self, ChannelDeliveryError> {
        let from = parse_mailbox(from)?;
        let to = to
            .iter()
            .map(|addr| parse_mailbox(addr))
            .collect::<Result<Vec<_>, _>>()?;
        if to.is_empty() {
            return Err(ChannelDeliveryError::Transport("no email recipients".into()));
        }

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| ChannelDeliveryError::Transport(e.to_string()))?
            .port(port);
        if !username.is_empty() {
            builder = builder.credentials(Credentials::new(username.to_string(), password.to_string()));
        }

        Ok(Self {
            from,
            to,
            transport: builder.build(),
        })
    }
}

fn parse_mailbox(addr: &str) -> Result<Mailbox, ChannelDeliveryError> {
    addr.parse()
        .map_err(|e: lettre::address::AddressError| ChannelDeliveryError::Transport(e.to_string()))
}

pub(crate) fn subject(event: &AlertEvent) -> String {
    format!(
        "[Vigil] [{}] {} - {}",
        event.severity.as_str().to_uppercase(),
        event.status.as_str(),
        event.rule_name
    )
}

pub(crate) fn body(event: &AlertEvent) -> String {
    format!(
        "{}\n\nRule: {}\nMetric: {}\nValue: {:.2}\nThreshold: {:.2}\nSeverity: {}\nStatus: {}\nTime: {}",
        event.message,
        event.rule_name,
        event.metric,
        event.current_value,
        event.threshold_value,
        event.severity.as_str(),
        event.status.as_str(),
        event.occurred_at.to_rfc3339(),
    )
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Email
    }

    async fn send(&self, event: &AlertEvent) -> Result<(), ChannelDeliveryError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(subject(event))
            .header(ContentType::TEXT_PLAIN);
        for rcpt in &self.to {
            builder = builder.to(rcpt.clone());
        }
        let email = builder
            .body(body(event))
            .map_err(|e| ChannelDeliveryError::Transport(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| ChannelDeliveryError::Transport(e.to_string()))?;

        Ok(())
    }
}
