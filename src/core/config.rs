use crate::core::RelayError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

include!(concat!(env!("OUT_DIR"), "/config_embedded.rs"));

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub model: String,
    pub system_instruction: String,
    pub thinking_budget: i32,
    /// Substituted for the response whenever the upstream call fails
    pub fallback_message: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    pub error_message: String,
    pub greeting: Option<String>,
    pub questions_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub client: ClientConfig,
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("Invalid default config")
    }
}

impl Config {
    /// Loads `config.toml` from the working directory, falling back to the
    /// embedded defaults when no such file exists.
    pub fn load() -> Result<Self, RelayError> {
        let config_path = Path::new("config.toml");
        if config_path.exists() {
            Self::load_from(config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, RelayError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            RelayError::ConfigError(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        toml::from_str(&contents)
            .map_err(|e| RelayError::ConfigError(format!("Failed to parse config file: {e}")))
    }

    pub fn override_bind(&mut self, bind: Option<String>) {
        if let Some(bind) = bind {
            self.server.bind = bind;
        }
    }

    pub fn override_endpoint(&mut self, endpoint: Option<String>) {
        if let Some(endpoint) = endpoint {
            self.client.endpoint = endpoint;
        }
    }
}
