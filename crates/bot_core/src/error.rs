//! Error types for the decision core.
//!
//! None of these abort a tick. Planner and micro helpers produce them,
//! the caller logs them, and the affected action is simply omitted until a
//! later tick. Only configuration loading hands them back to the host.

use thiserror::Error;

use crate::snapshot::Tag;
use crate::unit_type::UnitType;

/// Result type alias using [`BotError`].
pub type Result<T> = std::result::Result<T, BotError>;

/// Top-level error type for the decision core.
#[derive(Debug, Error)]
pub enum BotError {
    /// A unit or structure type has no entry in the static tables.
    #[error("No configuration for {kind:?}")]
    MissingConfiguration {
        /// The type that could not be resolved.
        kind: UnitType,
    },

    /// A tag no longer resolves in the current snapshot.
    #[error("Tag {0} is no longer present in the snapshot")]
    StaleReference(Tag),

    /// Not enough resources to act this tick.
    #[error("Cannot afford {kind:?}: need {minerals} minerals and {gas} gas")]
    Unaffordable {
        /// What was being paid for.
        kind: UnitType,
        /// Minerals required.
        minerals: u32,
        /// Gas required.
        gas: u32,
    },

    /// Failed to read a configuration file.
    #[error("Failed to read configuration file '{path}': {source}")]
    ConfigIo {
        /// Path that failed to load.
        path: String,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },

    /// Configuration text could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        /// Parser error message.
        message: String,
    },

    /// Configuration parsed but failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal state could not be encoded.
    #[error("Failed to encode state: {0}")]
    StateEncoding(String),
}
