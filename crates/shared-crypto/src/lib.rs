//! # Shared Crypto - Default Messaging Library
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `signatures` | Ed25519 | Message, profile and fingerprint signatures |
//! | `hashing` | BLAKE3 | Address and search-number derivation |
//! | `encoding` | Base64 | Wire form of keys, data and signatures |
//! | `library` | - | `MessagingLibrary` implementation, local accounts |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod encoding;
pub mod errors;
pub mod hashing;
pub mod library;
pub mod signatures;

// Re-exports
pub use encoding::{base64_decode, base64_encode};
pub use errors::CryptoError;
pub use hashing::{address_from_key, blake3_hash};
pub use library::{Account, DimLibrary};
pub use signatures::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
