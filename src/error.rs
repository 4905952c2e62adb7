//! Error handling and custom error types
//!
//! Provides unified error handling across the converter using thiserror.
//! Per-item failures carry structured fields so callers can match on them,
//! while the display text stays the message shown in failure records.

use thiserror::Error;

/// Which part of a binary attachment was absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPart {
    /// The item carries no attachments at all.
    Attachments,
    /// The fixed attachment slot is empty.
    Slot,
    /// The attachment has metadata but no payload.
    Payload,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("No binary data exists on item!")]
    MissingBinaryData { missing: MissingPart },

    #[error("No image data exists on item!")]
    NotAnImage { file_type: Option<String> },

    #[error("Item has no base64 string in field '{field}'")]
    MissingInputField { field: String },

    #[error("Could not decode image: {0}")]
    UnsupportedOrCorruptImage(String),

    #[error("Could not encode image as {format}: {message}")]
    EncodeFailure {
        format: &'static str,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invariant violated: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, Error>;
