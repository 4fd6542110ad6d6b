//! Error types for the ffbot core library.
//!
//! Only setup-time failures (loading configuration, settings and phrase
//! banks) are errors. Decision-time problems such as a vanished target or an
//! unreachable goal are handled inside the behaviors and never surface here.

use thiserror::Error;

/// Top-level error type for all ffbot operations.
#[derive(Error, Debug)]
pub enum BotError {
    /// Configuration could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The key→value settings layer failed to build or read a value.
    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    /// A phrase bank file is malformed.
    #[error("Phrase bank error: {0}")]
    PhraseBank(String),

    /// A statement references a phrase that is not in the loaded bank.
    #[error("Unknown phrase: {0}")]
    UnknownPhrase(String),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for BotError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, BotError>;
