use crate::error::{CobbleError, Result, ResultExt};
use crate::logger::LogSeverity;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Server configuration, read from a JSON file. Every field has a default, so `{}` is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_address: String,
    pub world_path: PathBuf,
    /// Sent in the handshake reply
    pub server_id: String,
    pub server_name: String,
    pub motd: String,
    /// Size of the session identifier pool
    pub max_clients: usize,
    /// Radius in chunks streamed around spawn after login. 0 disables streaming.
    pub view_distance: i32,
    /// Upper bound for the handshake and login waits. Unset means wait forever.
    pub handshake_timeout_secs: Option<u64>,
    pub log_level: LogSeverity,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:25565".to_owned(),
            world_path: PathBuf::from("world"),
            server_id: "bcfd241a420f886e".to_owned(),
            server_name: "cobble".to_owned(),
            motd: "A Minecraft Server".to_owned(),
            max_clients: 64,
            view_distance: 0,
            handshake_timeout_secs: None,
            log_level: LogSeverity::Info,
        }
    }
}

impl ServerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .context(format!("could not read config file {}", path.display()))?;
        Self::from_json(&contents).context(format!("invalid config file {}", path.display()))
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let config: ServerConfig = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_clients == 0 {
            return Err(CobbleError::ConfigError(
                "max_clients must be at least 1".to_owned(),
            ));
        }
        if self.max_clients > i32::MAX as usize {
            return Err(CobbleError::ConfigError(format!(
                "max_clients must not exceed {}",
                i32::MAX
            )));
        }
        if self.view_distance < 0 {
            return Err(CobbleError::ConfigError(
                "view_distance must not be negative".to_owned(),
            ));
        }
        Ok(())
    }

    pub fn handshake_timeout(&self) -> Option<Duration> {
        self.handshake_timeout_secs.map(Duration::from_secs)
    }
}
