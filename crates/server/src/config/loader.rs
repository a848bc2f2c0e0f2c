use std::path::Path;

use super::schema::ServerConfig;

const MAX_RETRIES: u32 = 10;
const MAX_RETRY_DELAY_MS: u64 = 60_000;
const MAX_INTERVAL_SECONDS: u64 = 86_400;
const MAX_RETENTION_HOURS: u64 = 87_600;

#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Parse(serde_yaml::Error),
    Validation(String),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Parse(e) => write!(f, "parse: {e}"),
            Self::Validation(msg) => write!(f, "validation: {msg}"),
        }
    }
}

impl std::error::Error for LoadError {}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_yaml::Error> for LoadError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Parse(e)
    }
}

pub fn load_from_file(path: &Path) -> Result<ServerConfig, LoadError> {
    let contents = std::fs::read_to_string(path)?;
    load_from_str(&contents)
}

/// Reads `path` if it exists, otherwise falls back to built-in defaults.
pub fn load_or_default(path: &Path) -> Result<ServerConfig, LoadError> {
    if path.exists() {
        load_from_file(path)
    } else {
        Ok(ServerConfig::default())
    }
}

pub fn load_from_str(yaml: &str) -> Result<ServerConfig, LoadError> {
    let cfg: ServerConfig = serde_yaml::from_str(yaml)?;
    validate(&cfg)?;
    Ok(cfg)
}

fn validate(cfg: &ServerConfig) -> Result<(), LoadError> {
    if cfg.scheduler.interval_seconds == 0 || cfg.scheduler.interval_seconds > MAX_INTERVAL_SECONDS {
        return Err(LoadError::Validation(format!(
            "scheduler.interval_seconds must be in 1..={MAX_INTERVAL_SECONDS}"
        )));
    }
    if cfg.engine.history_retention_hours > MAX_RETENTION_HOURS {
        return Err(LoadError::Validation(format!(
            "engine.history_retention_hours must be <= {MAX_RETENTION_HOURS}"
        )));
    }
    if cfg.notifications.retries > MAX_RETRIES {
        return Err(LoadError::Validation(format!(
            "notifications.retries must be <= {MAX_RETRIES}"
        )));
    }
    if cfg.notifications.retry_base_delay_ms > MAX_RETRY_DELAY_MS {
        return Err(LoadError::Validation(format!(
            "notifications.retry_base_delay_ms must be <= {MAX_RETRY_DELAY_MS}"
        )));
    }
    if cfg.notifications.timeout_seconds == 0 {
        return Err(LoadError::Validation(
            "notifications.timeout_seconds must be > 0".into(),
        ));
    }
    if cfg.engine.evaluation_timeout_seconds <= cfg.notifications.timeout_seconds {
        return Err(LoadError::Validation(
            "engine.evaluation_timeout_seconds must exceed notifications.timeout_seconds".into(),
        ));
    }
    if let Some(email) = &cfg.notifications.email {
        if email.host.is_empty() || email.to.is_empty() {
            return Err(LoadError::Validation(
                "notifications.email needs a host and at least one recipient".into(),
            ));
        }
    }
    if let Some(discord) = &cfg.notifications.discord {
        if !discord.webhook_url.starts_with("https://") && !discord.webhook_url.starts_with("http://") {
            return Err(LoadError::Validation(
                "notifications.discord.webhook_url must be an http(s) URL".into(),
            ));
        }
    }
    for rule in &cfg.rules {
        rule.validate()
            .map_err(|e| LoadError::Validation(format!("rule '{}': {e}", rule.name)))?;
    }
    Ok(())
}
