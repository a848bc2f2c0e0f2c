mod channel;
mod discord;
mod dispatcher;
mod retry;
mod smtp;

pub use channel::{ChannelDeliveryError, Notifier};
pub use discord::DiscordNotifier;
pub use dispatcher::{DispatchOutcome, DispatchResult, NotificationDispatcher};
pub use retry::RetryNotifier;
pub use smtp::EmailNotifier;
