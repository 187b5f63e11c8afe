mod config;
pub mod error;
pub mod payload;

pub use config::ClientConfig;
pub use config::Config;
pub use config::ServerConfig;
pub use config::UpstreamConfig;
pub use error::RelayError;
pub use payload::FragmentPayload;
