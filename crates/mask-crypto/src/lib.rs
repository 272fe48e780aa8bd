//! mask-crypto: Client-side encryption for MaskStore
//!
//! Everything that leaves the device is an encrypted frame:
//!
//! ```text
//! [12 bytes: random nonce][N bytes: AES-256-GCM ciphertext + 16-byte tag]
//! ```
//!
//! One 256-bit vault key seals all content. Decryption takes an
//! operator-supplied base64 key string, so any session holding the
//! disclosed key can open a frame — the store never sees either.

pub mod frame;
pub mod keys;

pub use frame::{open, seal};
pub use keys::{generate_vault_key, operator_key_from_base64, VaultKey};

/// Size of the vault key in bytes (256-bit AES)
pub const KEY_SIZE: usize = 32;

/// Size of an AES-GCM nonce (96-bit)
pub const NONCE_SIZE: usize = 12;

/// Size of a GCM authentication tag
pub const TAG_SIZE: usize = 16;
