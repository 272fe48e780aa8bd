use serde::{Deserialize, Serialize};

/// One sealed item in the vault ledger.
///
/// Created on successful upload and immutable afterwards; entries are never
/// edited or individually deleted, only aged out when the ledger overflows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultEntry {
    /// Human-readable name declared at upload time
    pub name: String,
    /// Content identifier of the encrypted frame in the blob store
    pub cid: String,
    /// MIME type declared at upload time (drives preview selection)
    #[serde(rename = "type")]
    pub mime: String,
}

/// Lifecycle of the vault's single symmetric key.
///
/// Transitions only move forward: `NoKey → GeneratedUndisclosed →
/// GeneratedDisclosed`. The only way back to `NoKey` is an explicit
/// administrative reset, since silently regenerating the key would orphan
/// every previously sealed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    /// No key has ever been generated
    NoKey,
    /// A key exists but has not yet been shown to the user
    GeneratedUndisclosed,
    /// The key exists and its one-time disclosure has been spent
    GeneratedDisclosed,
}

/// How decrypted content should be presented, chosen from the MIME type
/// the uploader declared (not re-sniffed from the plaintext).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    /// `image/*` — render directly
    Image,
    /// `application/pdf` — embedded document viewer
    Document,
    /// `text/*` — embedded text viewer
    Text,
    /// Anything else — offer download only
    Download,
}

impl PreviewKind {
    pub fn for_mime(mime: &str) -> Self {
        if mime.starts_with("image/") {
            PreviewKind::Image
        } else if mime == "application/pdf" {
            PreviewKind::Document
        } else if mime.starts_with("text/") {
            PreviewKind::Text
        } else {
            PreviewKind::Download
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_serializes_with_legacy_type_field() {
        let entry = VaultEntry {
            name: "note.txt".into(),
            cid: "abc123".into(),
            mime: "text/plain".into(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains(r#""type":"text/plain""#));

        let back: VaultEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn preview_classification() {
        assert_eq!(PreviewKind::for_mime("image/png"), PreviewKind::Image);
        assert_eq!(PreviewKind::for_mime("image/svg+xml"), PreviewKind::Image);
        assert_eq!(PreviewKind::for_mime("application/pdf"), PreviewKind::Document);
        assert_eq!(PreviewKind::for_mime("text/plain"), PreviewKind::Text);
        assert_eq!(PreviewKind::for_mime("text/csv"), PreviewKind::Text);
        assert_eq!(
            PreviewKind::for_mime("application/octet-stream"),
            PreviewKind::Download
        );
        assert_eq!(PreviewKind::for_mime(""), PreviewKind::Download);
    }
}
