//! Error types for the habit_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for habit_core operations
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

    /// Habit store error
    #[error("Store error: {0}")]
    Store(String),

    /// Calendar date rejected at the input boundary
    #[error("Invalid date: {0}")]
    Date(String),

    /// Recurrence rule rejected at the input boundary
    #[error("Invalid recurrence: {0}")]
    Recurrence(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
