//! # Networking Error Types

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors loading a game configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        /// File that was opened.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The TOML is malformed or has wrongly typed fields.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors setting up transports and sessions.
#[derive(Error, Debug)]
pub enum NetworkError {
    /// Socket or thread setup failed.
    #[error("network I/O: {0}")]
    Io(#[from] io::Error),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for networking setup.
pub type NetResult<T> = Result<T, NetworkError>;
