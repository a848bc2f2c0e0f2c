mod loader;
mod schema;

pub use loader::{load_from_file, load_from_str, load_or_default, LoadError};
pub use schema::{DiscordConfig, EmailConfig, EngineSection, NotificationsConfig, SchedulerConfig, ServerConfig};
