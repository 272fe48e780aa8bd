//! Retrieval pipeline: fetch → import operator key → open → classify
//!
//! This path never touches [`crate::KeyVault`]: the decrypting key is
//! whatever string the operator supplies, which is what lets a different
//! session or device open the vault with only the disclosed key.

use secrecy::SecretString;
use zeroize::Zeroize;

use mask_core::types::{PreviewKind, VaultEntry};
use mask_core::VaultResult;
use mask_crypto::operator_key_from_base64;
use mask_storage::{get_frame, Operator, StringStore};

use crate::ledger::VaultLedger;

/// Fallback MIME type when no ledger entry matches the CID
const FALLBACK_MIME: &str = "application/octet-stream";
/// Fallback display name when no ledger entry matches the CID
const FALLBACK_NAME: &str = "decrypted_file";

/// Decrypted content, held only in memory and zeroized on drop. Callers
/// keep it alive exactly as long as the preview and no longer.
pub struct Plaintext {
    bytes: Vec<u8>,
}

impl Plaintext {
    fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Drop for Plaintext {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for Plaintext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Plaintext({} bytes)", self.bytes.len())
    }
}

/// A successfully unlocked entry, ready for preview.
#[derive(Debug)]
pub struct Retrieved {
    pub plaintext: Plaintext,
    /// MIME type as declared at upload time (not sniffed from the bytes)
    pub mime: String,
    pub name: String,
    pub preview: PreviewKind,
}

/// Fetch and decrypt the content pinned at `cid` using an
/// operator-supplied key string.
///
/// Errors keep their causes apart deliberately: a store failure, a
/// malformed key string, a truncated frame, and a failed tag check each
/// ask the user for a different fix.
pub async fn retrieve<S: StringStore>(
    op: &Operator,
    prefix: &str,
    ledger: &VaultLedger<S>,
    cid: &str,
    operator_key: &SecretString,
) -> VaultResult<Retrieved> {
    let frame = get_frame(op, prefix, cid).await?;
    tracing::debug!(cid, bytes = frame.len(), "fetched encrypted frame");

    let key = operator_key_from_base64(operator_key)?;
    let bytes = mask_crypto::open(&key, &frame)?;

    // Metadata comes from the ledger entry for this CID (declared at
    // upload time); a retrieval on a device without the ledger still
    // works, it just loses the nice name and preview hint.
    let (name, mime) = match ledger.find(cid)? {
        Some(VaultEntry { name, mime, .. }) if !mime.is_empty() => (name, mime),
        Some(VaultEntry { name, .. }) => (name, FALLBACK_MIME.to_string()),
        None => (FALLBACK_NAME.to_string(), FALLBACK_MIME.to_string()),
    };

    let preview = PreviewKind::for_mime(&mime);
    tracing::info!(cid, %name, %mime, "entry unlocked");

    Ok(Retrieved {
        plaintext: Plaintext::new(bytes),
        mime,
        name,
        preview,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plaintext_debug_hides_content() {
        let p = Plaintext::new(b"super secret".to_vec());
        let debug = format!("{p:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("12 bytes"));
    }
}
