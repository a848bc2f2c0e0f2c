use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

use vigil_engine::alert::AlertRule;
use vigil_engine::EngineConfig;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub rules: Vec<AlertRule>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SchedulerConfig {
    #[serde(default = "yes")]
    pub enabled: bool,
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EngineSection {
    #[serde(default = "default_max_escalations")]
    pub max_escalations: u32,
    #[serde(default = "yes")]
    pub notify_on_resolve: bool,
    #[serde(default = "default_retention_hours")]
    pub history_retention_hours: u64,
    #[serde(default = "default_max_events")]
    pub max_events_per_rule: usize,
    #[serde(default = "default_evaluation_timeout")]
    pub evaluation_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct NotificationsConfig {
    #[serde(default = "default_channel_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_base_delay_ms: u64,
    pub email: Option<EmailConfig>,
    pub discord: Option<DiscordConfig>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EmailConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub from: String,
    pub to: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DiscordConfig {
    pub webhook_url: String,
}

impl ServerConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            sample_interval: Duration::from_secs(self.scheduler.interval_seconds),
            max_escalations: self.engine.max_escalations,
            notify_on_resolve: self.engine.notify_on_resolve,
            history_retention: Duration::from_secs(self.engine.history_retention_hours.saturating_mul(3600)),
            max_events_per_rule: self.engine.max_events_per_rule,
            evaluation_timeout: Duration::from_secs(self.engine.evaluation_timeout_seconds),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            scheduler: SchedulerConfig::default(),
            engine: EngineSection::default(),
            notifications: NotificationsConfig::default(),
            rules: Vec::new(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: default_interval(),
        }
    }
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            max_escalations: default_max_escalations(),
            notify_on_resolve: true,
            history_retention_hours: default_retention_hours(),
            max_events_per_rule: default_max_events(),
            evaluation_timeout_seconds: default_evaluation_timeout(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_channel_timeout(),
            retries: default_retries(),
            retry_base_delay_ms: default_retry_delay(),
            email: None,
            discord: None,
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_interval() -> u64 {
    60
}

fn default_max_escalations() -> u32 {
    3
}

fn default_retention_hours() -> u64 {
    168
}

fn default_max_events() -> usize {
    1000
}

fn default_evaluation_timeout() -> u64 {
    30
}

fn default_channel_timeout() -> u64 {
    5
}

fn default_retries() -> u32 {
    1
}

fn default_retry_delay() -> u64 {
    200
}

fn default_smtp_port() -> u16 {
    587
}

fn yes() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg: ServerConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(cfg, ServerConfig::default());
        assert_eq!(cfg.listen_addr.port(), 8080);
        assert_eq!(cfg.notifications.timeout_seconds, 5);
        assert!(cfg.notifications.email.is_none());
    }

    #[test]
    fn engine_config_mapping() {
        let mut cfg = ServerConfig::default();
        cfg.scheduler.interval_seconds = 30;
        cfg.engine.history_retention_hours = 2;
        let ec = cfg.engine_config();
        assert_eq!(ec.sample_interval, Duration::from_secs(30));
        assert_eq!(ec.history_retention, Duration::from_secs(7200));
        assert_eq!(ec.max_escalations, 3);
    }

    #[test]
    fn smtp_port_defaults() {
        let yaml = r#"
notifications:
  email:
    host: smtp.example.com
    from: vigil@example.com
    to: [ops@example.com]
"#;
        let cfg: ServerConfig = serde_yaml::from_str(yaml).unwrap();
        let email = cfg.notifications.email.unwrap();
        assert_eq!(email.port, 587);
        assert!(email.username.is_empty());
    }
}
