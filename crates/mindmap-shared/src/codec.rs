//! Passphrase codec for document payloads.
//!
//! A value is serialized to JSON, encrypted under a key derived from the
//! passphrase, and wrapped into a self-contained base64 envelope:
//!
//! ```text
//! version (1) || salt (16) || nonce (24) || ciphertext + tag
//! ```
//!
//! Decryption only needs the envelope and the passphrase. Any failure on the
//! way back (bad base64, wrong passphrase, tampering, non-JSON plaintext) is
//! reported as `None` so callers can treat it as an authentication failure.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::constants::{ENVELOPE_VERSION, NONCE_SIZE, SALT_SIZE, TAG_SIZE};
use crate::crypto::{self, Salt};
use crate::error::CodecError;

const HEADER_SIZE: usize = 1 + SALT_SIZE;
const MIN_ENVELOPE_SIZE: usize = HEADER_SIZE + NONCE_SIZE + TAG_SIZE;

/// Serialize `value` and seal it under `passphrase`.
pub fn encrypt<T: Serialize + ?Sized>(value: &T, passphrase: &str) -> Result<String, CodecError> {
    if passphrase.is_empty() {
        return Err(CodecError::EmptyPassphrase);
    }

    let json = serde_json::to_vec(value)?;
    let salt = crypto::generate_salt();
    let key = crypto::derive_key_from_passphrase(passphrase.as_bytes(), &salt);

    let mut envelope = Vec::with_capacity(MIN_ENVELOPE_SIZE + json.len());
    envelope.push(ENVELOPE_VERSION);
    envelope.extend_from_slice(&salt);
    let sealed = crypto::seal(&key, &envelope, &json)?;
    envelope.extend_from_slice(&sealed);

    Ok(STANDARD.encode(envelope))
}

/// Open an envelope produced by [`encrypt`].
///
/// Returns `None` for a wrong passphrase or corrupt data.
pub fn decrypt<T: DeserializeOwned>(ciphertext: &str, passphrase: &str) -> Option<T> {
    let envelope = match STANDARD.decode(ciphertext.trim()) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(error = %e, "ciphertext is not valid base64");
            return None;
        }
    };

    if envelope.len() < MIN_ENVELOPE_SIZE {
        tracing::debug!(len = envelope.len(), "ciphertext envelope truncated");
        return None;
    }
    if envelope[0] != ENVELOPE_VERSION {
        tracing::debug!(version = envelope[0], "unknown ciphertext envelope version");
        return None;
    }

    let mut salt: Salt = [0u8; SALT_SIZE];
    salt.copy_from_slice(&envelope[1..HEADER_SIZE]);
    let key = crypto::derive_key_from_passphrase(passphrase.as_bytes(), &salt);

    let plaintext = match crypto::open(&key, &envelope[..HEADER_SIZE], &envelope[HEADER_SIZE..]) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(error = %e, "ciphertext rejected");
            return None;
        }
    };

    let text = match std::str::from_utf8(&plaintext) {
        Ok(text) if !text.is_empty() => text,
        Ok(_) => return None,
        Err(e) => {
            tracing::debug!(error = %e, "plaintext is not UTF-8");
            return None;
        }
    };

    match serde_json::from_str(text) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(error = %e, "plaintext is not the expected JSON");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Document, Edge, Node};

    fn sample_document() -> Document {
        let mut a = Node::new("a", 10.0, 20.0);
        a.data.label = "Root".into();
        a.data.bold = Some(true);
        let b = Node::new("b", 200.0, 40.5);
        Document {
            nodes: vec![a, b],
            edges: vec![Edge::new("e1", "a", "b")],
        }
    }

    #[test]
    fn test_document_roundtrip() {
        let doc = sample_document();
        let sealed = encrypt(&doc, "s3cret").unwrap();
        let opened: Document = decrypt(&sealed, "s3cret").unwrap();
        assert_eq!(opened, doc);
    }

    #[test]
    fn test_arbitrary_json_roundtrip() {
        let value = serde_json::json!({ "list": [1, 2, 3], "nested": { "ok": true }, "s": "日本語" });
        let sealed = encrypt(&value, "p").unwrap();
        let opened: serde_json::Value = decrypt(&sealed, "p").unwrap();
        assert_eq!(opened, value);
    }

    #[test]
    fn test_wrong_passphrase_returns_none() {
        let sealed = encrypt(&sample_document(), "right").unwrap();
        for wrong in ["wrong", "Right", "right ", "", "r", "rightright"] {
            assert!(decrypt::<Document>(&sealed, wrong).is_none(), "{wrong:?} opened");
        }
    }

    #[test]
    fn test_output_is_not_deterministic() {
        let doc = sample_document();
        assert_ne!(encrypt(&doc, "p").unwrap(), encrypt(&doc, "p").unwrap());
    }

    #[test]
    fn test_empty_passphrase_rejected() {
        assert!(matches!(
            encrypt(&sample_document(), ""),
            Err(CodecError::EmptyPassphrase)
        ));
    }

    #[test]
    fn test_garbage_returns_none() {
        assert!(decrypt::<Document>("not base64 at all!!", "p").is_none());
        assert!(decrypt::<Document>("", "p").is_none());
        assert!(decrypt::<Document>(&STANDARD.encode([1u8; 20]), "p").is_none());
    }

    #[test]
    fn test_unknown_version_returns_none() {
        let sealed = encrypt(&sample_document(), "p").unwrap();
        let mut bytes = STANDARD.decode(&sealed).unwrap();
        bytes[0] = 0x7f;
        assert!(decrypt::<Document>(&STANDARD.encode(bytes), "p").is_none());
    }

    #[test]
    fn test_swapped_salt_returns_none() {
        let sealed = encrypt(&sample_document(), "p").unwrap();
        let mut bytes = STANDARD.decode(&sealed).unwrap();
        bytes[1] ^= 0x01;
        assert!(decrypt::<Document>(&STANDARD.encode(bytes), "p").is_none());
    }

    #[test]
    fn test_wrong_shape_returns_none() {
        let sealed = encrypt(&serde_json::json!([1, 2, 3]), "p").unwrap();
        assert!(decrypt::<Document>(&sealed, "p").is_none());
    }
}
