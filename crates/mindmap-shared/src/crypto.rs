//! AEAD primitives behind the document codec.
//!
//! Keys are derived per envelope from the passphrase and a random salt. The
//! envelope header is bound as associated data, so a ciphertext cannot be
//! replayed under a different version byte or salt.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;

use crate::constants::{KDF_CONTEXT_DOCUMENT_KEY, NONCE_SIZE, SALT_SIZE, SYMMETRIC_KEY_SIZE, TAG_SIZE};
use crate::error::CryptoError;

pub type SymmetricKey = [u8; SYMMETRIC_KEY_SIZE];
pub type Salt = [u8; SALT_SIZE];

pub fn generate_salt() -> Salt {
    let mut salt = [0u8; SALT_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}

fn generate_nonce() -> [u8; NONCE_SIZE] {
    let mut nonce = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Encrypt `plaintext` bound to `header`. Output is `nonce || ct || tag`.
pub fn seal(key: &SymmetricKey, header: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let nonce_bytes = generate_nonce();
    let ciphertext = XChaCha20Poly1305::new(key.into())
        .encrypt(
            XNonce::from_slice(&nonce_bytes),
            Payload {
                msg: plaintext,
                aad: header,
            },
        )
        .map_err(|_| CryptoError::EncryptionFailed)?;

    let mut output = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    output.extend_from_slice(&nonce_bytes);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// Reverse [`seal`]. Fails on a wrong key, a different header or any
/// tampering.
pub fn open(key: &SymmetricKey, header: &[u8], sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if sealed.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::DecryptionFailed);
    }

    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_SIZE);
    XChaCha20Poly1305::new(key.into())
        .decrypt(
            XNonce::from_slice(nonce_bytes),
            Payload {
                msg: ciphertext,
                aad: header,
            },
        )
        .map_err(|_| CryptoError::DecryptionFailed)
}

// BLAKE3 KDF with domain separation; the salt makes every envelope use its own key
pub fn derive_key_from_passphrase(passphrase: &[u8], salt: &Salt) -> SymmetricKey {
    let mut hasher = blake3::Hasher::new_derive_key(KDF_CONTEXT_DOCUMENT_KEY);
    hasher.update(salt);
    hasher.update(passphrase);
    let hash = hasher.finalize();
    let mut key = [0u8; SYMMETRIC_KEY_SIZE];
    key.copy_from_slice(&hash.as_bytes()[..SYMMETRIC_KEY_SIZE]);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &[u8] = b"\x01salt-salt-salt!";

    #[test]
    fn test_sealed_size_is_nonce_plus_tag_overhead() {
        let key = derive_key_from_passphrase(b"hunter2", &generate_salt());
        let plaintext = br#"{"nodes":[],"edges":[]}"#;

        let sealed = seal(&key, HEADER, plaintext).unwrap();
        assert_eq!(sealed.len(), NONCE_SIZE + plaintext.len() + TAG_SIZE);
        assert_eq!(open(&key, HEADER, &sealed).unwrap(), plaintext);
    }

    #[test]
    fn test_header_is_authenticated() {
        let key = derive_key_from_passphrase(b"pass", &generate_salt());
        let sealed = seal(&key, HEADER, b"map").unwrap();

        let mut other = HEADER.to_vec();
        other[0] = 0x02;
        assert!(open(&key, &other, &sealed).is_err());
        assert!(open(&key, b"", &sealed).is_err());
    }

    #[test]
    fn test_same_passphrase_other_salt_cannot_open() {
        let sealed = seal(&derive_key_from_passphrase(b"pass", &[1u8; SALT_SIZE]), HEADER, b"map").unwrap();
        let other_key = derive_key_from_passphrase(b"pass", &[2u8; SALT_SIZE]);
        assert!(open(&other_key, HEADER, &sealed).is_err());
    }

    #[test]
    fn test_shorter_than_nonce_and_tag_fails() {
        let key = derive_key_from_passphrase(b"pass", &generate_salt());
        assert!(open(&key, HEADER, &[0u8; NONCE_SIZE + TAG_SIZE - 1]).is_err());
    }

    #[test]
    fn test_key_depends_on_salt_and_passphrase() {
        let salt = [7u8; SALT_SIZE];
        let key = derive_key_from_passphrase(b"pass", &salt);
        assert_eq!(key, derive_key_from_passphrase(b"pass", &salt));
        assert_ne!(key, derive_key_from_passphrase(b"pasS", &salt));
        assert_ne!(key, derive_key_from_passphrase(b"pass", &[8u8; SALT_SIZE]));
    }
}
