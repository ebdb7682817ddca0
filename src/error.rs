//! Error types for the novel-trans pipeline.
//!
//! Uses `thiserror` for structured error definitions. Each enum maps to one
//! failure class: input errors are fatal, gateway errors are recovered per
//! line, and storage/progress errors are contained to a single chapter.

use std::path::PathBuf;
use thiserror::Error;

/// The source document could not be loaded.
#[derive(Error, Debug)]
pub enum InputError {
    /// Failed to read the novel file
    #[error("Failed to read source document {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error type for configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// Missing required configuration value
    #[error("Missing required config value: {0}")]
    MissingValue(String),

    /// Invalid configuration value
    #[error("Invalid config value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Config directory not found
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Error type for a single gateway round trip.
#[derive(Error, Debug)]
pub enum TranslationError {
    /// HTTP request to API failed
    #[error("API request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error: {0}")]
    ApiError(String),

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Translation was refused by the model
    #[error("Translation refused: {0}")]
    Refused(String),

    /// The service answered with nothing usable
    #[error("Empty translation returned")]
    EmptyResponse,

    /// Invalid API configuration
    #[error("Invalid API configuration: {0}")]
    InvalidConfig(String),
}

/// Error type for the progress store.
#[derive(Error, Debug)]
pub enum ProgressError {
    /// Failed to read the progress file
    #[error("Failed to read progress file: {0}")]
    ReadError(#[source] std::io::Error),

    /// Progress file exists but is not a valid record
    #[error("Failed to parse progress file: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Failed to write the progress file
    #[error("Failed to save progress file {path}: {message}")]
    WriteError { path: PathBuf, message: String },
}

/// Error type for chapter storage and the output artifact.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Filesystem operation failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Manifest could not be encoded or decoded
    #[error("Invalid chapter manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

impl StorageError {
    /// Wraps an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Error type for pipeline control flow.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The operator selected a mode that does not exist
    #[error("Invalid mode selection: '{0}' (expected 1/batch or 2/interactive)")]
    InvalidMode(String),

    /// Reading operator input failed
    #[error("Failed to read operator input: {0}")]
    Prompt(#[from] std::io::Error),
}
