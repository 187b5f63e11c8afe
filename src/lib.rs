pub mod cli;
pub mod client;
pub mod core;
pub mod eventsource;
pub mod providers;
pub mod server;

pub use client::{ChatSession, RelayClient};
pub use crate::core::{Config, RelayError};
pub use providers::{GeminiClient, UpstreamClient};
