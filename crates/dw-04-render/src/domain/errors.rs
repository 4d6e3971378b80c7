//! Render errors.

use dw_01_template::TemplateError;
use shared_types::{DecodeError, VerifyError};
use thiserror::Error;

/// Errors raised while rendering messages into the document.
#[derive(Debug, Error)]
pub enum RenderError {
    /// No element with this id.
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    /// No template element with this id.
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// A markup fragment was not well formed.
    #[error("markup error: {0}")]
    Markup(String),

    /// Message data could not be turned into a record.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The sender string did not parse.
    #[error("message error, bad sender: {0}")]
    InvalidSender(String),

    /// The signature did not verify against the sender's meta.
    #[error("message from {sender} failed verification: {reason}")]
    Verification { sender: String, reason: VerifyError },

    /// A channel document did not decode.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Unknown permalink scheme name.
    #[error("unknown permalink scheme: {0}")]
    UnknownScheme(String),
}
