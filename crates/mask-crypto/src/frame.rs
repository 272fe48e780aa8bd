//! AES-256-GCM frame encryption/decryption
//!
//! Frame format (binary):
//! ```text
//! [12 bytes: random nonce][N bytes: ciphertext][16 bytes: GCM tag]
//! ```
//!
//! No header, version byte, or length prefix — the format is fixed by the
//! deployed fleet of already-sealed frames.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;

use mask_core::{VaultError, VaultResult};

use crate::keys::VaultKey;
use crate::NONCE_SIZE;

/// Seal a payload into an encrypted frame.
///
/// A fresh random 12-byte nonce is drawn for every call. Nonce reuse under
/// the same key breaks GCM confidentiality outright, so uniqueness per call
/// is a hard invariant here, not an optimization.
///
/// Returns: `[12-byte nonce][ciphertext][16-byte tag]`
pub fn seal(key: &VaultKey, plaintext: &[u8]) -> VaultResult<Vec<u8>> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| anyhow::anyhow!("frame encryption failed: {e}"))?;

    let mut frame = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    frame.extend_from_slice(&nonce_bytes);
    frame.extend_from_slice(&ciphertext);
    Ok(frame)
}

/// Open an encrypted frame.
///
/// Fails with [`VaultError::FrameTooShort`] before any AEAD work if the
/// frame cannot even contain a nonce, and with
/// [`VaultError::AuthenticationFailed`] when the tag check fails (wrong
/// key, or tampered/corrupted ciphertext). The two are distinct because
/// their remedies differ: re-enter the key versus re-fetch the content.
pub fn open(key: &VaultKey, frame: &[u8]) -> VaultResult<Vec<u8>> {
    if frame.len() < NONCE_SIZE {
        return Err(VaultError::FrameTooShort { len: frame.len() });
    }

    let (nonce_bytes, ciphertext) = frame.split_at(NONCE_SIZE);
    let nonce = Nonce::from_slice(nonce_bytes);
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| VaultError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_vault_key;
    use crate::TAG_SIZE;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn seal_open_roundtrip() {
        let key = generate_vault_key();
        let plaintext = b"hello, sealed world!";

        let frame = seal(&key, plaintext).unwrap();
        let opened = open(&key, &frame).unwrap();

        assert_eq!(&opened, plaintext);
    }

    #[test]
    fn seal_open_empty_payload() {
        let key = generate_vault_key();

        let frame = seal(&key, b"").unwrap();
        let opened = open(&key, &frame).unwrap();

        assert_eq!(opened, b"");
    }

    #[test]
    fn frame_size_is_nonce_plus_payload_plus_tag() {
        let key = generate_vault_key();
        let plaintext = vec![0u8; 1000];

        let frame = seal(&key, &plaintext).unwrap();

        assert_eq!(frame.len(), NONCE_SIZE + 1000 + TAG_SIZE);
    }

    #[test]
    fn wrong_key_is_authentication_failure() {
        let key1 = generate_vault_key();
        let key2 = generate_vault_key();

        let frame = seal(&key1, b"secret data").unwrap();
        let err = open(&key2, &frame).unwrap_err();

        assert!(matches!(err, VaultError::AuthenticationFailed));
    }

    #[test]
    fn tampered_ciphertext_is_authentication_failure() {
        let key = generate_vault_key();
        let mut frame = seal(&key, b"secret data").unwrap();

        // Flip a byte in the ciphertext (after the nonce)
        frame[NONCE_SIZE + 3] ^= 0xFF;

        let err = open(&key, &frame).unwrap_err();
        assert!(matches!(err, VaultError::AuthenticationFailed));
    }

    #[test]
    fn tampered_nonce_is_authentication_failure() {
        let key = generate_vault_key();
        let mut frame = seal(&key, b"secret data").unwrap();

        frame[0] ^= 0x01;

        let err = open(&key, &frame).unwrap_err();
        assert!(matches!(err, VaultError::AuthenticationFailed));
    }

    #[test]
    fn truncated_frame_rejected_before_aead() {
        let key = generate_vault_key();

        for len in 0..NONCE_SIZE {
            let frame = vec![0u8; len];
            let err = open(&key, &frame).unwrap_err();
            assert!(
                matches!(err, VaultError::FrameTooShort { len: l } if l == len),
                "frame of {len} bytes must be FrameTooShort"
            );
        }
    }

    #[test]
    fn nonces_are_unique_across_many_seals() {
        let key = generate_vault_key();
        let mut seen = HashSet::new();

        for _ in 0..10_000 {
            let frame = seal(&key, b"x").unwrap();
            let nonce: [u8; NONCE_SIZE] = frame[..NONCE_SIZE].try_into().unwrap();
            assert!(seen.insert(nonce), "nonce collision under the same key");
        }
    }

    proptest! {
        #[test]
        fn roundtrip_any_payload(data in proptest::collection::vec(any::<u8>(), 0..=4096)) {
            let key = generate_vault_key();
            let frame = seal(&key, &data).unwrap();
            let opened = open(&key, &frame).unwrap();
            prop_assert_eq!(opened, data);
        }

        #[test]
        fn any_single_byte_flip_fails_auth(
            data in proptest::collection::vec(any::<u8>(), 1..=256),
            flip in any::<proptest::sample::Index>(),
        ) {
            let key = generate_vault_key();
            let mut frame = seal(&key, &data).unwrap();
            let idx = flip.index(frame.len());
            frame[idx] ^= 0xFF;
            let result = open(&key, &frame);
            prop_assert!(matches!(result, Err(VaultError::AuthenticationFailed)));
        }
    }
}
