//! Configuration management

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::application::errors::ConfigError;
use crate::application::services::ChatSettings;
use crate::domain::entities::IdentityKey;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub server: ServerConfig,
    pub chat: ChatConfig,
    pub names: NamesConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerConfig {
    pub name: String,
    pub bind: String,
    pub port: u16,
    #[serde(default)]
    pub identity: IdentityMode,
}

/// How a peer address becomes a reconnection identity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentityMode {
    /// Same IP address, same user
    #[default]
    PeerIp,
    /// Same IP and port, same user
    PeerSocket,
}

impl IdentityMode {
    pub fn key_for(self, peer: SocketAddr) -> IdentityKey {
        match self {
            IdentityMode::PeerIp => IdentityKey::new(peer.ip().to_string()),
            IdentityMode::PeerSocket => IdentityKey::new(peer.to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChatConfig {
    pub command_prefix: String,
    pub max_message_length: usize,
    /// Raw line cap in bytes, applied before decoding
    pub max_line_bytes: usize,
    pub outbox_capacity: usize,
    pub show_timestamps: bool,
    pub anonymous_prefix: String,
    pub palette: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NamesConfig {
    pub min_length: usize,
    pub max_length: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SecurityConfig {
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RateLimitConfig {
    /// Debounce window after each accepted line; 0 disables it
    pub window_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        let chat = ChatSettings::default();
        Self {
            server: ServerConfig {
                name: "linechat".to_string(),
                bind: "0.0.0.0".to_string(),
                port: 5555,
                identity: IdentityMode::PeerIp,
            },
            chat: ChatConfig {
                command_prefix: chat.command_prefix,
                max_message_length: chat.max_message_length,
                max_line_bytes: chat.max_line_bytes,
                outbox_capacity: chat.outbox_capacity,
                show_timestamps: chat.show_timestamps,
                anonymous_prefix: chat.anonymous_prefix,
                palette: chat.palette,
            },
            names: NamesConfig {
                min_length: chat.min_name_length,
                max_length: chat.max_name_length,
            },
            security: SecurityConfig {
                rate_limit: RateLimitConfig {
                    window_ms: chat.rate_limit_window.as_millis() as u64,
                },
            },
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_env() -> Self {
        // Load from environment variables
        let mut config = Config::default();

        if let Ok(bind) = std::env::var("LINECHAT_BIND") {
            config.server.bind = bind;
        }

        if let Some(port) = std::env::var("LINECHAT_PORT").ok().and_then(|p| p.parse().ok()) {
            config.server.port = port;
        }

        if let Some(ms) = std::env::var("LINECHAT_RATE_LIMIT_MS").ok().and_then(|p| p.parse().ok()) {
            config.security.rate_limit.window_ms = ms;
        }

        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chat.command_prefix.is_empty() {
            return Err(ConfigError::InvalidValue("chat.command-prefix must not be empty".into()));
        }
        if self.chat.palette.is_empty() {
            return Err(ConfigError::InvalidValue("chat.palette must list at least one color".into()));
        }
        if self.chat.max_line_bytes < self.chat.max_message_length {
            return Err(ConfigError::InvalidValue(format!(
                "chat.max-line-bytes ({}) must be at least chat.max-message-length ({})",
                self.chat.max_line_bytes, self.chat.max_message_length
            )));
        }
        if self.chat.outbox_capacity == 0 {
            return Err(ConfigError::InvalidValue("chat.outbox-capacity must be at least 1".into()));
        }
        if self.names.min_length == 0 || self.names.min_length > self.names.max_length {
            return Err(ConfigError::InvalidValue(format!(
                "names.min-length ({}) must be between 1 and names.max-length ({})",
                self.names.min_length, self.names.max_length
            )));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.bind, self.server.port)
    }

    pub fn chat_settings(&self) -> ChatSettings {
        ChatSettings {
            command_prefix: self.chat.command_prefix.clone(),
            max_message_length: self.chat.max_message_length,
            max_line_bytes: self.chat.max_line_bytes,
            outbox_capacity: self.chat.outbox_capacity,
            min_name_length: self.names.min_length,
            max_name_length: self.names.max_length,
            rate_limit_window: Duration::from_millis(self.security.rate_limit.window_ms),
            show_timestamps: self.chat.show_timestamps,
            anonymous_prefix: self.chat.anonymous_prefix.clone(),
            palette: self.chat.palette.clone(),
        }
    }
}
