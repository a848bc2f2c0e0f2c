mod alerts;
mod error;
mod health;
mod metrics;
mod router;
mod rules;

pub use error::ApiError;
pub use router::{router, AppState};
