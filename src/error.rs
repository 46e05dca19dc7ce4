//! Error types for Stardust.
//!
//! The per-frame simulation path never fails: degenerate numeric state is
//! repaired in place. Errors only arise at the configuration boundary, when
//! names coming from a UI or a config file have to be interpreted.

use thiserror::Error;

/// Errors that can occur while interpreting configuration input.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A parameter name that no simulation setting answers to.
    #[error("Unknown parameter '{0}'")]
    UnknownParameter(String),
    /// A mode name other than `particle`, `galaxy` or `emitter-cloud`.
    #[error("Unknown simulation mode '{0}'. Expected one of: particle, galaxy, emitter-cloud")]
    UnknownMode(String),
    /// A color scheme name with no matching preset.
    #[error("Unknown color scheme '{0}'")]
    UnknownColorScheme(String),
    /// Malformed configuration JSON.
    #[error("Failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// Failed to read or write a configuration file.
    #[error("Failed to access configuration file: {0}")]
    Io(#[from] std::io::Error),
}
