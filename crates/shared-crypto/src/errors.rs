//! Crypto error types.

use shared_types::VerifyError;
use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Invalid key length
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length in bytes
        expected: usize,
        /// Actual key length in bytes
        actual: usize,
    },

    /// Signature verification failed
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// Invalid public key
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Unsupported key algorithm
    #[error("Unsupported key algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Invalid input for cryptographic operation
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<CryptoError> for VerifyError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::SignatureVerificationFailed => VerifyError::Mismatch,
            CryptoError::InvalidKeyLength { .. } | CryptoError::InvalidInput(_) => {
                VerifyError::InvalidFormat
            }
            CryptoError::InvalidPublicKey | CryptoError::UnsupportedAlgorithm(_) => {
                VerifyError::InvalidKey(e.to_string())
            }
        }
    }
}
