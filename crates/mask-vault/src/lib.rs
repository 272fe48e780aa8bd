//! mask-vault: the MaskStore vault core
//!
//! Pipeline: payload → AES-256-GCM frame → content-addressed put → ledger
//! entry. Retrieval runs the mirror image with an operator-supplied key.
//!
//! The vault owns exactly two pieces of durable local state, both kept in
//! the shared string store:
//!   - the key lifecycle (key material + generated/disclosed flags),
//!     owned by [`KeyVault`]
//!   - the bounded entry ledger, owned by [`VaultLedger`]
//!
//! Encryption never reaches into global key state: the upload pipeline
//! takes the key handle as an argument, and retrieval takes the key string
//! the operator typed in.

pub mod keyvault;
pub mod ledger;
pub mod retrieve;
pub mod upload;

pub use keyvault::KeyVault;
pub use ledger::{VaultLedger, LEDGER_CAP};
pub use retrieve::{retrieve, Plaintext, Retrieved};
pub use upload::{upload_bytes, upload_note, ProgressFn, MAX_NOTE_CHARS, MAX_PAYLOAD_BYTES};
