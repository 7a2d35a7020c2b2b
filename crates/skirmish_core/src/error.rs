//! Error types for the battle simulation.

use thiserror::Error;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// Map data is inconsistent (zero sized, wrong terrain length, ...).
    #[error("Invalid map data: {0}")]
    InvalidMap(String),

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration '{path}': {message}")]
    ConfigParseError {
        /// Path or label of the configuration source.
        path: String,
        /// Error message.
        message: String,
    },

    /// Unknown unit name in a map marker or command.
    #[error("Unknown unit kind: {0}")]
    UnknownUnitKind(String),
}
