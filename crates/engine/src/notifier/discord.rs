use async_trait::async_trait;
use reqwest::Client;

use super::channel::{ChannelDeliveryError, Notifier};
use crate::alert::{AlertEvent, ChannelKind, EventStatus, Severity};

pub struct DiscordNotifier {
    webhook_url: String,
    client: Client,
}

impl DiscordNotifier {
    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url,
            client: Client::new(),
        }
    }
}

pub(crate) fn embed_payload(event: &AlertEvent) -> serde_json::Value {
    let color = match (event.status, event.severity) {
        (EventStatus::Resolved, _) => 0x36a64f,
        (_, Severity::Low) => 0x3498db,
        (_, Severity::Medium) => 0xf2c744,
        (_, Severity::High) => 0xe67e22,
        (_, Severity::Critical) => 0xd32f2f,
    };

    serde_json::json!({
        "embeds": [{
            "title": format!("[{}] {}", event.severity.as_str().to_uppercase(), event.rule_name),
            "description": &event.message,
            "color": color,
            "timestamp": event.occurred_at.to_rfc3339(),
            "fields": [
                { "name": "Status", "value": event.status.as_str(), "inline": true },
                { "name": "Metric", "value": &event.metric, "inline": true },
                { "name": "Value", "value": format!("{:.2}", event.current_value), "inline": true },
                { "name": "Threshold", "value": format!("{:.2}", event.threshold_value), "inline": true },
            ],
        }]
    })
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Discord
    }

    async fn send(&self, event: &AlertEvent) -> Result<(), ChannelDeliveryError> {
        self.client
            .post(&self.webhook_url)
            .json(&embed_payload(event))
            .send()
            .await
            .map_err(|e| ChannelDeliveryError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| ChannelDeliveryError::Transport(e.to_string()))?;

        Ok(())
    }
}
