use std::sync::Arc;
use std::time::Duration;

use vigil_engine::notifier::{
    ChannelDeliveryError, DiscordNotifier, EmailNotifier, NotificationDispatcher, RetryNotifier,
};

use crate::config::NotificationsConfig;

/// Builds the dispatcher from the `notifications` section. Each configured
/// channel is wrapped in a retrying notifier.
pub fn build_dispatcher(cfg: &NotificationsConfig) -> Result<NotificationDispatcher, ChannelDeliveryError> {
    let mut dispatcher = NotificationDispatcher::new(Duration::from_secs(cfg.timeout_seconds));
    let delay = Duration::from_millis(cfg.retry_base_delay_ms);

    if let Some(email) = &cfg.email {
        let notifier = EmailNotifier::new(
            &email.host,
            email.port,
            &email.username,
            &email.password,
            &email.from,
            &email.to,
        )?;
        dispatcher = dispatcher.with_notifier(Arc::new(RetryNotifier::new(notifier, cfg.retries, delay)));
        tracing::info!(host = %email.host, recipients = email.to.len(), "email channel enabled");
    }

    if let Some(discord) = &cfg.discord {
        let notifier = DiscordNotifier::new(discord.webhook_url.clone());
        dispatcher = dispatcher.with_notifier(Arc::new(RetryNotifier::new(notifier, cfg.retries, delay)));
        tracing::info!("discord channel enabled");
    }

    if dispatcher.channels().is_empty() {
        tracing::warn!("no notification channels configured");
    }
    Ok(dispatcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DiscordConfig, EmailConfig};
    use vigil_engine::alert::ChannelKind;

    fn email() -> EmailConfig {
        EmailConfig {
            host: "smtp.example.com".into(),
            port: 587,
            username: String::new(),
            password: String::new(),
            from: "vigil@example.com".into(),
            to: vec!["ops@example.com".into()],
        }
    }

    #[test]
    fn empty_config_has_no_channels() {
        let d = build_dispatcher(&NotificationsConfig::default()).unwrap();
        assert!(d.channels().is_empty());
        assert_eq!(d.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn both_channels_registered() {
        let cfg = NotificationsConfig {
            email: Some(email()),
            discord: Some(DiscordConfig {
                webhook_url: "https://discord.com/api/webhooks/1/x".into(),
            }),
            ..Default::default()
        };
        let d = build_dispatcher(&cfg).unwrap();
        assert_eq!(d.channels(), vec![ChannelKind::Email, ChannelKind::Discord]);
    }

    #[test]
    fn bad_sender_address_fails() {
        let mut e = email();
        e.from = "not an address".into();
        let cfg = NotificationsConfig {
            email: Some(e),
            ..Default::default()
        };
        assert!(build_dispatcher(&cfg).is_err());
    }
}
