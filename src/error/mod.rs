//! Error types and handling for the chatjack engine
//!
//! The engine core is not allowed to take down its host: degraded paths
//! (unknown chains, draw timeouts, failing steps) are logged and tolerated,
//! and only operations whose outcome the caller must act on return an error.

use thiserror::Error;

/// Result type alias for chatjack operations
pub type Result<T> = std::result::Result<T, Error>;

/// Chatjack error types
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Action {action} is not legal in phase {phase}")]
    InvalidPhase { action: &'static str, phase: String },

    #[error("Unknown participant: {0}")]
    UnknownParticipant(String),

    #[error("Template resolution failed: {0}")]
    TemplateResolution(String),

    #[error("Dispatch failed: {0}")]
    Dispatch(String),

    #[error("Session store failure: {0}")]
    SessionStore(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}
