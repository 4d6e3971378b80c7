//! # Address Derivation
//!
//! BLAKE3 digests used to bind identities to keys.
//!
//! - **Address**: hex of the first 20 bytes of `BLAKE3(public key)`
//! - **Search number**: ten decimal digits taken from `BLAKE3(address)`

/// BLAKE3 hash output (256-bit).
pub type Hash = [u8; 32];

/// Length of an address digest in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Hash data with BLAKE3 (one-shot).
pub fn blake3_hash(data: &[u8]) -> Hash {
    *blake3::hash(data).as_bytes()
}

/// Derive the address string for a public key.
pub fn address_from_key(public_key: &[u8]) -> String {
    let digest = blake3_hash(public_key);
    hex::encode(&digest[..ADDRESS_LEN])
}

/// Search number of an address, in `0..10_000_000_000`.
pub fn search_number(address: &str) -> u64 {
    let digest = blake3_hash(address.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(head) % 10_000_000_000
}

/// Format a search number as `ddd-ddd-dddd`.
pub fn format_number(number: u64) -> String {
    let digits = format!("{:010}", number);
    format!("{}-{}-{}", &digits[..3], &digits[3..6], &digits[6..])
}
