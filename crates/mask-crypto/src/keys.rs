//! Vault key handle, generation, and base64 import/export

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroize;

use mask_core::{VaultError, VaultResult};

use crate::KEY_SIZE;

/// The vault's 256-bit AES-GCM key. Zeroized on drop.
///
/// Key bytes are only reachable by the frame codec; callers pass the handle
/// around opaquely and `Debug` never prints material.
#[derive(Clone)]
pub struct VaultKey {
    bytes: [u8; KEY_SIZE],
}

impl VaultKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Export as the persisted/disclosed base64 form.
    pub fn to_base64(&self) -> SecretString {
        SecretString::from(STANDARD.encode(self.bytes))
    }
}

impl Drop for VaultKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Generate a random 256-bit vault key.
pub fn generate_vault_key() -> VaultKey {
    let mut bytes = [0u8; KEY_SIZE];
    rand::thread_rng().fill_bytes(&mut bytes);
    VaultKey::from_bytes(bytes)
}

/// Import an operator-supplied key string for decryption.
///
/// This path is deliberately decoupled from the vault's own persisted key:
/// the decrypting party may be a different session or device holding only
/// the key string shown at generation time.
///
/// Fails with [`VaultError::MalformedKey`] if the input is empty, not valid
/// base64, or does not decode to exactly 32 bytes.
pub fn operator_key_from_base64(encoded: &SecretString) -> VaultResult<VaultKey> {
    let trimmed = encoded.expose_secret().trim();
    if trimmed.is_empty() {
        return Err(VaultError::MalformedKey("key string is empty".into()));
    }

    let mut decoded = STANDARD
        .decode(trimmed)
        .map_err(|_| VaultError::MalformedKey("must be a base64 string".into()))?;

    if decoded.len() != KEY_SIZE {
        let len = decoded.len();
        decoded.zeroize();
        return Err(VaultError::MalformedKey(format!(
            "decodes to {len} bytes (expected {KEY_SIZE})"
        )));
    }

    let mut bytes = [0u8; KEY_SIZE];
    bytes.copy_from_slice(&decoded);
    decoded.zeroize();

    Ok(VaultKey::from_bytes(bytes))
}
