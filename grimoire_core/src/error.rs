//! Error types for the grimoire_core library.

use crate::types::SpellId;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for grimoire_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Spellbook validation error
    #[error("Spellbook validation error: {0}")]
    SpellbookValidation(String),

    /// The host cannot resolve this spell reference
    #[error("Unknown spell: {0}")]
    UnknownSpell(SpellId),

    /// Negative XP amounts are rejected outright
    #[error("Invalid XP amount: {0}")]
    InvalidAmount(f64),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
