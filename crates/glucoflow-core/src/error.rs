//! Core error types for glucoflow-core.
//!
//! Arithmetic domain errors propagate to the caller. Invariant violations
//! come from interactive edits and leave the edited state untouched, so a
//! caller can drop them and treat the edit as "nothing happened".

use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Core error type for glucoflow-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Curve or factor parameters outside the arithmetic domain
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Refused curve editor mutation
    #[error("Invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),

    /// Malformed input data
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Factor id not owned by the model
    #[error("Unknown factor: {0}")]
    UnknownFactor(Uuid),

    /// Factor id already owned by the model
    #[error("Factor already added: {0}")]
    DuplicateFactor(Uuid),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parameters for which the activity model is undefined.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// `peak == duration / 2` makes the rise factor divide by zero.
    #[error("peak {peak} is exactly half of duration {duration}; decay constant is undefined")]
    DegeneratePeak { peak: f64, duration: f64 },

    /// Peak must fall strictly inside `(0, duration)`.
    #[error("peak {peak} must lie strictly between 0 and duration {duration}")]
    PeakOutOfRange { peak: f64, duration: f64 },

    /// Duration must be positive.
    #[error("duration must be positive, got {0}")]
    NonPositiveDuration(f64),

    /// Intermediate constant came out NaN or infinite.
    #[error("decay constants are not finite for peak {peak}, duration {duration}")]
    NonFinite { peak: f64, duration: f64 },

    /// Factor amounts are never negative.
    #[error("amount must not be negative, got {0}")]
    NegativeAmount(f64),

    /// Sampling interval must be at least one minute.
    #[error("sampling interval must be positive, got {0} minutes")]
    NonPositiveSampling(i64),

    /// Grams per insulin unit must be positive.
    #[error("carb ratio must be positive, got {0}")]
    NonPositiveRatio(f64),

    /// Unit scales must be finite numbers.
    #[error("scale must be finite, got {0}")]
    NonFiniteScale(f64),

    /// Editor geometry that leaves no usable drawing box.
    #[error("invalid editor layout: {field} = {value}")]
    InvalidLayout { field: String, value: f64 },
}

/// Refused curve editor edits.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvariantViolation {
    /// First and last control points cannot be deleted.
    #[error("control point {0} is a pinned edge and cannot be deleted")]
    PinnedEndpoint(usize),

    /// Point index does not exist.
    #[error("control point index {index} out of bounds (length: {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// A point would land closer than the minimum spacing to a neighbor.
    #[error("x = {x} is closer than {min_spacing} to a neighboring control point")]
    TooClose { x: f64, min_spacing: f64 },

    /// A point would land outside the drawing box.
    #[error("x = {x} lies outside the drawing box [0, {width}]")]
    OutsideBox { x: f64, width: f64 },

    /// Coordinates must be finite numbers.
    #[error("control point ({x}, {y}) is not finite")]
    NonFinite { x: f64, y: f64 },
}

/// Validation errors for input data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Empty collection
    #[error("Empty collection: {0}")]
    EmptyCollection(String),

    /// Timestamps must strictly increase at a fixed interval.
    #[error("sample {index} breaks uniform spacing: expected {expected_minutes} minutes, got {actual_minutes}")]
    NonUniformSpacing {
        index: usize,
        expected_minutes: i64,
        actual_minutes: i64,
    },

    /// Clock string could not be parsed.
    #[error("cannot parse '{0}' as HH:MM:SS")]
    InvalidClock(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
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

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Home directory could not be determined
    #[error("cannot determine home directory")]
    NoHomeDir,
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
