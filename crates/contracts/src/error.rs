//! Layered error definitions
//!
//! Categorized by source: config / transport / inference / encoding

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Transport Errors =====
    /// Device could not be opened at all (fatal at startup)
    #[error("failed to open '{source_name}': {message}")]
    TransportOpen {
        source_name: String,
        message: String,
    },

    /// Read failure on an open device (transient)
    #[error("read error on '{source_name}': {message}")]
    TransportRead {
        source_name: String,
        message: String,
    },

    // ===== Processing Errors =====
    /// Depth model failure
    #[error("depth inference failed: {message}")]
    Inference { message: String },

    /// Buffer or grid dimensions do not match
    #[error("{what} shape mismatch: expected {expected}, got {actual}")]
    Shape {
        what: &'static str,
        expected: String,
        actual: String,
    },

    /// Image encoding failure
    #[error("{format} encoding failed: {message}")]
    Encoding {
        format: &'static str,
        message: String,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create transport open error
    pub fn transport_open(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransportOpen {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create transport read error
    pub fn transport_read(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransportRead {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create inference error
    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference {
            message: message.into(),
        }
    }

    /// Create encoding error
    pub fn encoding(format: &'static str, message: impl Into<String>) -> Self {
        Self::Encoding {
            format,
            message: message.into(),
        }
    }
}
