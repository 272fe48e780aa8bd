//! Upload pipeline: validate → seal → pin → record
//!
//! Orchestration order matters: both local rejections (size, ledger
//! capacity) fire before any crypto or network work, and the ledger entry
//! is appended only after the store confirms the pin — a failed put must
//! never leave a ledger record pointing at nothing.

use std::time::{SystemTime, UNIX_EPOCH};

use mask_core::types::VaultEntry;
use mask_core::{VaultError, VaultResult};
use mask_crypto::VaultKey;
use mask_storage::{put_frame, Operator, StringStore};

use crate::ledger::{VaultLedger, LEDGER_CAP};

/// Upload cap for binary payloads (10 MiB)
pub const MAX_PAYLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Character cap for text notes, enforced before encoding to bytes
pub const MAX_NOTE_CHARS: usize = 5000;

/// Advisory progress callback, 0–100. Milestones before the transfer
/// begins are coarse (validated, sealing, sealed); once bytes start
/// moving the store's own transfer progress takes over.
pub type ProgressFn = Box<dyn Fn(u8) + Send + Sync>;

fn report(progress: Option<&ProgressFn>, pct: u8) {
    if let Some(cb) = progress {
        cb(pct);
    }
}

/// Seal a payload and pin it, recording a ledger entry on success.
///
/// The key arrives as an explicit handle rather than being pulled from
/// [`crate::KeyVault`] here; the caller decides which key seals what.
/// Returns the CID of the pinned frame.
pub async fn upload_bytes<S: StringStore>(
    op: &Operator,
    prefix: &str,
    ledger: &VaultLedger<S>,
    key: &VaultKey,
    payload: &[u8],
    name: &str,
    mime: &str,
    progress: Option<&ProgressFn>,
) -> VaultResult<String> {
    if payload.len() > MAX_PAYLOAD_BYTES {
        return Err(VaultError::PayloadTooLarge {
            size: payload.len(),
            limit: MAX_PAYLOAD_BYTES,
        });
    }

    // Refuse rather than evict: the user explicitly resets or accepts
    // eviction elsewhere, never as a side effect of an upload. This early
    // check only skips the seal-and-pin work; the binding check is the
    // try_append below, under the same lock as the insert.
    if ledger.is_full()? {
        return Err(VaultError::LedgerFull { cap: LEDGER_CAP });
    }

    report(progress, 10);
    tracing::debug!(name, mime, bytes = payload.len(), "sealing payload");

    report(progress, 30);
    let frame = mask_crypto::seal(key, payload)?;
    report(progress, 90);

    let cid = match progress {
        Some(cb) => {
            let transfer = |done: u64, total: u64| {
                let pct = if total == 0 {
                    100
                } else {
                    ((done.saturating_mul(100)) / total).min(100) as u8
                };
                cb(pct);
            };
            put_frame(op, prefix, &frame, Some(&transfer)).await?
        }
        None => put_frame(op, prefix, &frame, None).await?,
    };

    // A refusal here leaves the frame pinned but unrecorded; the store is
    // content-addressed, so a later upload of the same bytes reclaims it.
    ledger.try_append(VaultEntry {
        name: name.to_string(),
        cid: cid.clone(),
        mime: mime.to_string(),
    })?;
    report(progress, 100);

    tracing::info!(name, cid = %cid, "entry sealed and recorded");
    Ok(cid)
}

/// Seal a text note. The character cap applies to what the user typed,
/// before UTF-8 encoding; an omitted name falls back to a
/// timestamp-derived one, matching what the product has always shown.
pub async fn upload_note<S: StringStore>(
    op: &Operator,
    prefix: &str,
    ledger: &VaultLedger<S>,
    key: &VaultKey,
    text: &str,
    name: Option<&str>,
    progress: Option<&ProgressFn>,
) -> VaultResult<String> {
    let chars = text.chars().count();
    if chars > MAX_NOTE_CHARS {
        return Err(VaultError::NoteTooLong {
            chars,
            limit: MAX_NOTE_CHARS,
        });
    }

    let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) => n.to_string(),
        None => format!("Doc-{}.txt", unix_millis()),
    };

    upload_bytes(op, prefix, ledger, key, text.as_bytes(), &name, "text/plain", progress).await
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}
