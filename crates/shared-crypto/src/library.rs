//! # Default Messaging Library
//!
//! `DimLibrary` implements the page's `MessagingLibrary` port with Ed25519
//! meta keys and BLAKE3-derived addresses. `Account` is the signing side,
//! used for registration and by test fixtures.

use serde_json::json;
use shared_types::{
    Content, DecodeError, Identity, Message, MessagingLibrary, Meta, MetaKey, Payload, Profile,
    VerifyError,
};
use std::collections::BTreeMap;
use tracing::debug;

use crate::encoding::{base64_decode, base64_encode};
use crate::hashing::{address_from_key, format_number, search_number};
use crate::signatures::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
use crate::CryptoError;

/// Key algorithm tag carried in meta documents.
pub const ALGORITHM_ED25519: &str = "ED25519";

/// Current meta version.
pub const META_VERSION: u8 = 1;

/// Ed25519-backed messaging library.
#[derive(Debug, Clone, Copy, Default)]
pub struct DimLibrary;

impl DimLibrary {
    /// Create the library.
    pub fn new() -> Self {
        Self
    }

    fn public_key(meta: &Meta) -> Result<Ed25519PublicKey, CryptoError> {
        if !meta.key.algorithm.eq_ignore_ascii_case(ALGORITHM_ED25519) {
            return Err(CryptoError::UnsupportedAlgorithm(meta.key.algorithm.clone()));
        }
        Ed25519PublicKey::from_base64(&meta.key.data)
    }

    fn verify_bytes(meta: &Meta, data: &[u8], signature: &str) -> Result<(), VerifyError> {
        let key = Self::public_key(meta)?;
        let signature = Ed25519Signature::from_base64(signature)?;
        key.verify(data, &signature)?;
        Ok(())
    }
}

impl MessagingLibrary for DimLibrary {
    fn decode_meta(&self, payload: &Payload) -> Result<Meta, DecodeError> {
        let meta: Meta = serde_json::from_value(payload.clone())
            .map_err(|e| DecodeError::MalformedDocument(format!("meta: {e}")))?;
        if meta.version == 0 {
            return Err(DecodeError::MalformedDocument("meta: version 0".into()));
        }
        Self::public_key(&meta).map_err(|e| DecodeError::MalformedDocument(format!("meta: {e}")))?;
        Ok(meta)
    }

    fn meta_matches(&self, meta: &Meta, identity: &Identity) -> bool {
        let Ok(key) = Self::public_key(meta) else {
            return false;
        };
        if address_from_key(key.as_bytes()) != identity.address() {
            debug!(identity = %identity, "Meta key does not derive the address");
            return false;
        }
        if let Some(name) = identity.name() {
            if meta.seed.as_deref() != Some(name) {
                debug!(identity = %identity, seed = ?meta.seed, "Meta seed differs from name");
                return false;
            }
        }
        match (&meta.seed, &meta.fingerprint) {
            (Some(seed), Some(fingerprint)) => {
                Self::verify_bytes(meta, seed.as_bytes(), fingerprint).is_ok()
            }
            (Some(_), None) => false,
            (None, _) => true,
        }
    }

    fn decode_profile(&self, payload: &Payload) -> Result<Profile, DecodeError> {
        let profile: Profile = serde_json::from_value(payload.clone())
            .map_err(|e| DecodeError::MalformedDocument(format!("profile: {e}")))?;
        if profile.identifier.is_empty() {
            return Err(DecodeError::MalformedDocument("profile: empty ID".into()));
        }
        Ok(profile)
    }

    fn verify_profile(&self, profile: &Profile, meta: &Meta) -> Result<(), VerifyError> {
        let (Some(data), Some(signature)) = (&profile.data, &profile.signature) else {
            return Err(VerifyError::InvalidFormat);
        };
        Self::verify_bytes(meta, data.as_bytes(), signature)
    }

    fn verify_message(&self, message: &Message, meta: &Meta) -> Result<(), VerifyError> {
        let data = base64_decode(&message.data)
            .map_err(|_| DecodeError::InvalidBase64 { field: "data" })?;
        Self::verify_bytes(meta, &data, &message.signature)
    }

    fn decode_content(&self, message: &Message) -> Result<Content, DecodeError> {
        let data = base64_decode(&message.data)
            .map_err(|_| DecodeError::InvalidBase64 { field: "data" })?;
        serde_json::from_slice(&data)
            .map_err(|e| DecodeError::MalformedDocument(format!("content: {e}")))
    }

    fn number_string(&self, identity: &Identity) -> String {
        format_number(search_number(identity.address()))
    }
}

/// A local account: keypair plus seed name.
pub struct Account {
    seed: String,
    keypair: Ed25519KeyPair,
}

impl Account {
    /// Register a new account with a random key.
    pub fn generate(seed: &str) -> Self {
        Self {
            seed: seed.to_string(),
            keypair: Ed25519KeyPair::generate(),
        }
    }

    /// Restore an account from its secret seed bytes.
    pub fn from_secret(seed: &str, secret: [u8; 32]) -> Self {
        Self {
            seed: seed.to_string(),
            keypair: Ed25519KeyPair::from_seed(secret),
        }
    }

    /// The account identity, `seed@address`.
    pub fn identity(&self) -> Identity {
        let address = address_from_key(self.keypair.public_key().as_bytes());
        Identity::new(Some(self.seed.clone()), address)
    }

    /// The account meta.
    pub fn meta(&self) -> Meta {
        Meta {
            version: META_VERSION,
            seed: Some(self.seed.clone()),
            key: MetaKey {
                algorithm: ALGORITHM_ED25519.to_string(),
                data: self.keypair.public_key().to_base64(),
            },
            fingerprint: Some(self.keypair.sign(self.seed.as_bytes()).to_base64()),
        }
    }

    /// The account meta as a response payload.
    pub fn meta_payload(&self) -> Payload {
        serde_json::to_value(self.meta()).unwrap_or(Payload::Null)
    }

    /// Post a text message at `time`.
    pub fn post(&self, text: &str, time: i64) -> Message {
        self.post_content(&json!({"type": 1, "text": text}), time)
    }

    /// Post arbitrary encoded `content` at `time`.
    pub fn post_content(&self, content: &Payload, time: i64) -> Message {
        let content = content.to_string();
        let data = content.as_bytes();
        Message {
            sender: self.identity().to_string(),
            data: base64_encode(data),
            signature: self.keypair.sign(data).to_base64(),
            time,
            title: None,
            link: None,
        }
    }

    /// A signed profile carrying `properties`.
    pub fn profile(&self, properties: &BTreeMap<String, String>) -> Profile {
        let data = serde_json::to_string(properties).unwrap_or_else(|_| "{}".to_string());
        Profile {
            identifier: self.identity().to_string(),
            signature: Some(self.keypair.sign(data.as_bytes()).to_base64()),
            data: Some(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_matches_own_identity() {
        let lib = DimLibrary::new();
        let moky = Account::generate("moky");
        let meta = lib.decode_meta(&moky.meta_payload()).unwrap();

        assert!(lib.meta_matches(&meta, &moky.identity()));
        // Bare address is enough.
        let bare = moky.identity().with_name(None);
        assert!(lib.meta_matches(&meta, &bare));
    }

    #[test]
    fn test_meta_mismatch() {
        let lib = DimLibrary::new();
        let moky = Account::generate("moky");
        let hulk = Account::generate("hulk");

        assert!(!lib.meta_matches(&hulk.meta(), &moky.identity()));

        // Right key, wrong name.
        let renamed = moky.identity().with_name(Some("hulk".into()));
        assert!(!lib.meta_matches(&moky.meta(), &renamed));

        // Forged fingerprint.
        let mut forged = moky.meta();
        forged.fingerprint = hulk.meta().fingerprint;
        assert!(!lib.meta_matches(&forged, &moky.identity()));
    }

    #[test]
    fn test_decode_meta_rejects_bad_key() {
        let lib = DimLibrary::new();
        let bad = json!({"version": 1, "key": {"algorithm": "RSA", "data": "xx"}});
        assert!(lib.decode_meta(&bad).is_err());
        assert!(lib.decode_meta(&json!({"seed": "x"})).is_err());
    }

    #[test]
    fn test_message_verification() {
        let lib = DimLibrary::new();
        let moky = Account::generate("moky");
        let msg = moky.post("hello", 1_560_000_000);

        assert!(lib.verify_message(&msg, &moky.meta()).is_ok());
        let content = lib.decode_content(&msg).unwrap();
        assert_eq!(content.text.as_deref(), Some("hello"));

        let other = Account::generate("moky");
        assert_eq!(
            lib.verify_message(&msg, &other.meta()),
            Err(VerifyError::Mismatch)
        );

        let mut tampered = msg.clone();
        tampered.data = base64_encode(b"{\"text\":\"bye\"}");
        assert!(lib.verify_message(&tampered, &moky.meta()).is_err());
    }

    #[test]
    fn test_profile_verification() {
        let lib = DimLibrary::new();
        let moky = Account::generate("moky");
        let mut props = BTreeMap::new();
        props.insert("name".to_string(), "Moky".to_string());

        let profile = moky.profile(&props);
        let decoded = lib
            .decode_profile(&serde_json::to_value(&profile).unwrap())
            .unwrap();
        assert_eq!(decoded.name().as_deref(), Some("Moky"));
        assert!(lib.verify_profile(&decoded, &moky.meta()).is_ok());

        let unsigned = Profile {
            signature: None,
            ..decoded
        };
        assert_eq!(
            lib.verify_profile(&unsigned, &moky.meta()),
            Err(VerifyError::InvalidFormat)
        );
    }

    #[test]
    fn test_number_string_shape() {
        let lib = DimLibrary::new();
        let number = lib.number_string(&Account::generate("moky").identity());
        assert_eq!(number.len(), 12);
        assert_eq!(&number[3..4], "-");
    }

    #[test]
    fn test_restored_account_same_identity() {
        let a = Account::from_secret("moky", [9u8; 32]);
        let b = Account::from_secret("moky", [9u8; 32]);
        assert_eq!(a.identity(), b.identity());
    }
}
