//! # Error Types
//!
//! Defines error types shared by the page subsystems.

use thiserror::Error;

/// Errors raised while decoding wire documents or identity strings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Identity string could not be parsed.
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    /// A JSON document did not have the expected shape.
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// A base64 field could not be decoded.
    #[error("Invalid base64 in field {field}")]
    InvalidBase64 { field: &'static str },
}

/// Errors raised while verifying a message or document signature.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerifyError {
    /// The meta key could not be used for verification.
    #[error("Unsupported or invalid key: {0}")]
    InvalidKey(String),

    /// Signature bytes were malformed.
    #[error("Invalid signature format")]
    InvalidFormat,

    /// Signature did not match the signed data.
    #[error("Signature verification failed")]
    Mismatch,

    /// Signed payload could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// The messaging library has not been installed yet.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("Messaging library not loaded")]
pub struct LibraryNotLoaded;
