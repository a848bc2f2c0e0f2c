use async_trait::async_trait;
use std::time::Duration;

use crate::alert::{AlertEvent, ChannelKind};

#[async_trait]
pub trait Notifier: Send + Sync {
    fn kind(&self) -> ChannelKind;
    async fn send(&self, event: &AlertEvent) -> Result<(), ChannelDeliveryError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelDeliveryError {
    NotConfigured(ChannelKind),
    Timeout(Duration),
    Transport(String),
}

impl std::fmt::Display for ChannelDeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotConfigured(kind) => write!(f, "notify: no {kind} channel configured"),
            Self::Timeout(d) => write!(f, "notify: timed out after {}ms", d.as_millis()),
            Self::Transport(msg) => write!(f, "notify: {msg}"),
        }
    }
}

impl std::error::Error for ChannelDeliveryError {}
