//! Error types and handling for configuration composition

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for composition operations
#[derive(Debug, Error)]
pub enum StrataError {
    /// A layer's scope contains an invalid glob pattern
    #[error("Malformed scope pattern '{pattern}' in layer at position {position}: {message}")]
    MalformedScope {
        pattern: String,
        position: usize,
        message: String,
    },

    /// A single rule table declares the same rule identifier twice
    #[error("Duplicate rule key '{rule_id}' in table at position {position}")]
    DuplicateRuleKey { rule_id: String, position: usize },

    /// A derived source's factory failed; the whole run is rejected
    #[error("Layer resolution failed at position {position}: {message}")]
    LayerResolutionFailed { position: usize, message: String },

    /// A source was appended after the compatibility source was registered
    #[error("Layer '{id}' declared after the compatibility layer")]
    CompatibilitySealed { id: String },

    /// Declaration loading or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Scope,
    Rule,
    Resolution,
    Config,
    Io,
}

impl StrataError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            StrataError::MalformedScope { .. } => ErrorKind::Scope,
            StrataError::DuplicateRuleKey { .. } => ErrorKind::Rule,
            StrataError::LayerResolutionFailed { .. } => ErrorKind::Resolution,
            StrataError::CompatibilitySealed { .. } => ErrorKind::Config,
            StrataError::ConfigError { .. } => ErrorKind::Config,
            StrataError::IoError { .. } => ErrorKind::Io,
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a resolution failure for the source declared at `position`
    pub fn resolution_failed(position: usize, message: impl Into<String>) -> Self {
        Self::LayerResolutionFailed {
            position,
            message: message.into(),
        }
    }

    /// Create an I/O error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }
}
