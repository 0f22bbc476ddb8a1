//! Core error types for randoffee-core.
//!
//! Errors are split by the layer that raises them: validation of inputs,
//! group generation, configuration and storage. [`CoreError`] wraps all of
//! them for callers that don't need to tell them apart.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for randoffee-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Group generation errors
    #[error("Generation error: {0}")]
    Generate(#[from] GenerateError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Roster and history storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Input that was rejected before any work was done.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Not enough participants to form a single group
    #[error("Roster too small: {len} participant(s), at least {min} required")]
    RosterTooSmall { len: usize, min: usize },

    /// Same identifier listed twice
    #[error("Duplicate participant '{0}'")]
    DuplicateParticipant(String),

    /// Blank identifier
    #[error("Participant identifier must not be empty")]
    EmptyParticipant,

    /// Bad group size configuration
    #[error("Invalid group size: {0}")]
    InvalidGroupSize(String),

    /// Similarity threshold outside [0, 1]
    #[error("Similarity threshold {0} must be between 0 and 1")]
    InvalidThreshold(f64),

    /// Retry budget of zero
    #[error("Attempt budget must be at least 1")]
    ZeroAttempts,

    /// A permutation that is not a set partition
    #[error("Permutation dated {date} is invalid: {reason}")]
    InvalidPermutation {
        date: chrono::NaiveDate,
        reason: String,
    },

    /// Malformed roster file line
    #[error("Invalid roster entry at {path}:{line}: {reason}")]
    InvalidRosterEntry {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

/// Failures of [`GroupGenerator::generate`](crate::generator::GroupGenerator::generate).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerateError {
    /// Roster, configuration or history failed validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Every attempt resembled recent history too closely
    #[error(
        "Could not find a sufficiently novel grouping after {attempts} attempt(s): \
         threshold {threshold}, closest candidate scored {best_similarity:.4}"
    )]
    NoveltyExhausted {
        attempts: usize,
        threshold: f64,
        /// Lowest worst-case similarity seen across all attempts.
        best_similarity: f64,
    },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Roster and history storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Required file does not exist
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Refused to overwrite an accepted round
    #[error("A round is already stored at {0} (use force to overwrite)")]
    AlreadyExists(PathBuf),

    /// A file could not be parsed
    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
