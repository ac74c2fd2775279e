//! # Game Configuration
//!
//! One TOML file describes both roles. Every section and every field is
//! optional; anything missing falls back to its default.
//!
//! ```toml
//! log_level = "debug"
//!
//! [world]
//! sync_period = 3
//! inbox_capacity = 16
//!
//! [world.arena]
//! width = 640.0
//! height = 480.0
//!
//! [net]
//! tick_rate = 60
//! server_addr = "127.0.0.1:7777"
//! client_addr = "127.0.0.1:7778"
//!
//! [simulation]
//! drop_percent = 5
//! ```

use crate::error::ConfigError;
use crate::simulation::LinkConditions;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::Path;
use vectrek_core::WorldConfig;
use vectrek_shared::TICK_RATE;

/// Transport and pacing settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Where the authoritative server listens
    pub server_addr: SocketAddr,
    /// Where the predicting client listens
    pub client_addr: SocketAddr,
    /// Bound of the inbound message queue
    pub queue_capacity: usize,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            tick_rate: TICK_RATE,
            server_addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 7777)),
            client_addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 7778)),
            queue_capacity: 1024,
        }
    }
}

/// Complete configuration for a server or client process.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// `tracing` filter directive, e.g. `"info"` or `"vectrek_core=debug"`
    pub log_level: String,
    /// Simulation parameters
    pub world: WorldConfig,
    /// Transport and pacing
    pub net: NetConfig,
    /// Artificial loss applied to outbound messages
    pub simulation: LinkConditions,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            world: WorldConfig::default(),
            net: NetConfig::default(),
            simulation: LinkConditions::PERFECT,
        }
    }
}

impl GameConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] on malformed TOML or wrongly typed fields.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, [`ConfigError::Parse`]
    /// if it is not a valid configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_default() {
        assert_eq!(GameConfig::from_toml_str("").unwrap(), GameConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = GameConfig::from_toml_str(
            r#"
            [world]
            sync_period = 5

            [world.arena]
            width = 800.0

            [net]
            server_addr = "10.0.0.1:9000"

            [simulation]
            drop_percent = 20
            seed = 99
            "#,
        )
        .unwrap();

        assert_eq!(config.world.sync_period, 5);
        assert_eq!(config.world.arena.width, 800.0);
        assert_eq!(config.world.arena.height, 480.0);
        assert_eq!(config.world.inbox_capacity, 16);
        assert_eq!(config.net.server_addr, "10.0.0.1:9000".parse().unwrap());
        assert_eq!(config.net.tick_rate, 60);
        assert_eq!(config.simulation.drop_percent, 20);
        assert_eq!(config.simulation.seed, 99);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_wrong_type_is_parse_error() {
        let err = GameConfig::from_toml_str("[net]\ntick_rate = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = GameConfig::load("/nonexistent/vectrek.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
