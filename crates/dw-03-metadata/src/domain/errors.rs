//! Metadata errors.

use shared_bus::HandlerError;
use shared_types::{DecodeError, LibraryNotLoaded, VerifyError};
use thiserror::Error;

/// Errors raised by the metadata cache and its response handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    /// The messaging library is not installed yet.
    #[error("messaging library not loaded")]
    LibraryNotLoaded,

    /// The response path does not belong to a meta or profile route.
    #[error("not a document path: {0}")]
    UnexpectedPath(String),

    /// The identity in the path or document did not parse.
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    /// The meta document did not decode.
    #[error("meta error: {0}")]
    MalformedMeta(DecodeError),

    /// The meta does not belong to the identity it was served for.
    #[error("meta does not match {identity}")]
    MetaMismatch { identity: String },

    /// The profile document did not decode.
    #[error("profile error: {0}")]
    MalformedProfile(DecodeError),

    /// The profile names a different address than the path.
    #[error("profile {profile} served for {identity}")]
    ProfileMismatch { identity: String, profile: String },

    /// The profile signature did not verify against the owner's meta.
    #[error("profile of {identity} rejected: {reason}")]
    ProfileRejected { identity: String, reason: VerifyError },
}

impl From<LibraryNotLoaded> for MetadataError {
    fn from(_: LibraryNotLoaded) -> Self {
        MetadataError::LibraryNotLoaded
    }
}

impl From<MetadataError> for HandlerError {
    fn from(err: MetadataError) -> Self {
        match err {
            MetadataError::MalformedMeta(e) | MetadataError::MalformedProfile(e) => {
                HandlerError::Decode(e)
            }
            other => HandlerError::Rejected(other.to_string()),
        }
    }
}
