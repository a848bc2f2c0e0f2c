pub mod config;
pub mod notify;
pub mod probe;
pub mod rest;
pub mod scheduler;
pub mod shutdown;
