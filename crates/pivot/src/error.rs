//! # Configuration Error Types

use std::path::PathBuf;

use pivot_rotation::RotationError;
use thiserror::Error;

/// Errors raised while loading or applying the client configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid TOML or does not match the schema.
    #[error("malformed configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// The `[rotation]` table was rejected by the rotation engine.
    #[error("invalid rotation settings: {0}")]
    Rotation(#[from] RotationError),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
