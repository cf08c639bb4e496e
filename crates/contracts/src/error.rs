//! Layered error definitions
//!
//! Categorized by source: config / frame / detector / actuation

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum SignalError {
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

    // ===== Frame Acquisition Errors =====
    /// Frame read error
    #[error("frame read error on source '{source_id}': {message}")]
    FrameRead { source_id: String, message: String },

    /// Frame source ended
    #[error("frame source '{source_id}' reached end of stream")]
    EndOfStream { source_id: String },

    // ===== Detector Errors =====
    /// Detector capability failure
    #[error("detector error: {message}")]
    Detector { message: String },

    /// Detector produced an inconsistent observation
    #[error(
        "inconsistent observation for '{direction}': count {count} != sum of type counts {type_sum}"
    )]
    InconsistentObservation {
        direction: String,
        count: u32,
        type_sum: u32,
    },

    // ===== Actuation Errors =====
    /// Light write failure
    #[error("actuation error on '{target}': {message}")]
    Actuation { target: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl SignalError {
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

    /// Create frame read error
    pub fn frame_read(source_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FrameRead {
            source_id: source_id.into(),
            message: message.into(),
        }
    }

    /// Create detector error
    pub fn detector(message: impl Into<String>) -> Self {
        Self::Detector {
            message: message.into(),
        }
    }

    /// Create actuation error
    pub fn actuation(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Actuation {
            target: target.into(),
            message: message.into(),
        }
    }
}
