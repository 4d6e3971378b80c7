//! # Base64 Encodings
//!
//! Message `data`, signatures and meta keys travel as standard base64.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::CryptoError;

/// Encode bytes as standard base64.
pub fn base64_encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decode standard base64.
pub fn base64_decode(text: &str) -> Result<Vec<u8>, CryptoError> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| CryptoError::InvalidInput(format!("base64: {e}")))
}

/// Decode base64 into a fixed-size array.
pub fn base64_decode_array<const N: usize>(text: &str) -> Result<[u8; N], CryptoError> {
    let bytes = base64_decode(text)?;
    let actual = bytes.len();
    bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidKeyLength { expected: N, actual })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_and_errors() {
        let text = base64_encode(b"hello");
        assert_eq!(text, "aGVsbG8=");
        assert_eq!(base64_decode(&text).unwrap(), b"hello");
        assert!(base64_decode("not base64!").is_err());
    }

    #[test]
    fn test_fixed_size() {
        let text = base64_encode(&[1u8; 32]);
        let key: [u8; 32] = base64_decode_array(&text).unwrap();
        assert_eq!(key, [1u8; 32]);

        let short = base64_decode_array::<64>(&text);
        assert!(matches!(
            short,
            Err(CryptoError::InvalidKeyLength { expected: 64, actual: 32 })
        ));
    }
}
