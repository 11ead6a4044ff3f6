//! Error types for Vanguard.

use thiserror::Error;

use crate::ids::EffectInstanceId;

/// Top-level error type for Vanguard operations.
#[derive(Debug, Error)]
pub enum VanguardError {
    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Effect errors
    #[error("Effect error: {0}")]
    Effect(#[from] EffectError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read or written
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    /// Config file could not be parsed
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// Config could not be serialized
    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    /// A value is outside its allowed range
    #[error("Invalid config value for {field}: {reason}")]
    Invalid {
        /// Offending field
        field: String,
        /// Why the value was rejected
        reason: String,
    },
}

/// Errors raised by timed effects and damage listeners.
#[derive(Debug, Error)]
pub enum EffectError {
    /// Another live instance already publishes state for this effect kind
    #[error("{kind} is already owned by {owner}")]
    KindAlreadyOwned {
        /// Effect kind name
        kind: &'static str,
        /// Instance currently holding the kind
        owner: EffectInstanceId,
    },

    /// A damage listener could not handle an event
    #[error("Listener failed: {0}")]
    ListenerFailed(String),

    /// Effect tuning is unusable
    #[error("Invalid tuning for {kind}: {reason}")]
    InvalidTuning {
        /// Effect kind name
        kind: &'static str,
        /// Why the tuning was rejected
        reason: String,
    },
}

/// Result type alias for Vanguard operations.
pub type VanguardResult<T> = Result<T, VanguardError>;
