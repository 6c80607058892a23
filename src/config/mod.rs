//! Controller configuration
//!
//! Settings come from an optional TOML file, then CLI overrides, and are
//! validated once before anything is built. Pixel count and queue capacity
//! are fixed for the life of the process.

mod loader;

pub use loader::{from_file, load, Args};

use pixel_commander_shared::limits;
use serde::Deserialize;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Configuration validation failed:\n{0}")]
    Invalid(String),
}

/// Network identity and listen address
///
/// Station/access-point bring-up happens outside this process; the
/// identity and timeout are carried for it and logged at startup.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkConfig {
    pub ssid: String,
    pub password: String,
    pub listen: SocketAddr,
    pub connect_timeout_ms: u64,
    pub reply_backlog: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            ssid: "pixel-commander".into(),
            password: String::new(),
            listen: SocketAddr::from(([0, 0, 0, 0], 8080)),
            connect_timeout_ms: 15_000,
            reply_backlog: limits::DEFAULT_REPLY_BACKLOG,
        }
    }
}

impl fmt::Debug for NetworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkConfig")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .field("listen", &self.listen)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("reply_backlog", &self.reply_backlog)
            .finish()
    }
}

/// LED strip wiring
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StripConfig {
    pub data_pin: u8,
    pub pixel_count: u16,
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            data_pin: 5,
            pixel_count: 60,
        }
    }
}

/// Command queue sizing and executor pacing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueConfig {
    pub capacity: usize,
    pub drain_per_tick: usize,
    pub tick_interval_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: limits::DEFAULT_QUEUE_CAPACITY,
            drain_per_tick: limits::DEFAULT_DRAIN_PER_TICK,
            tick_interval_ms: 5,
        }
    }
}

/// Complete controller configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerConfig {
    pub network: NetworkConfig,
    pub strip: StripConfig,
    pub queue: QueueConfig,
}

impl ControllerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.queue.tick_interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.network.connect_timeout_ms)
    }

    /// Check every field, reporting all problems at once
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.network.reply_backlog == 0 {
            errors.push("network.reply_backlog must be at least 1");
        }
        if self.strip.pixel_count == 0 {
            errors.push("strip.pixel_count must be at least 1");
        }
        if self.queue.capacity == 0 {
            errors.push("queue.capacity must be at least 1");
        }
        if self.queue.drain_per_tick == 0 {
            errors.push("queue.drain_per_tick must be at least 1");
        }
        if self.queue.tick_interval_ms == 0 {
            errors.push("queue.tick_interval_ms must be at least 1");
        }

        if errors.is_empty() {
            return Ok(());
        }

        let message = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");
        Err(ConfigError::Invalid(message))
    }
}
