//! Content-addressed put/get of encrypted frames
//!
//! Frames live at `{prefix}/blobs/{cid}` where the CID is the BLAKE3 hex
//! digest of the frame bytes. Addressing by content makes a repeated put of
//! the same frame a no-op rather than a duplicate pin, which is also why
//! the core never retries a failed put on its own.

use opendal::{ErrorKind, Operator};

use mask_core::{VaultError, VaultResult};

/// Transfer progress callback: (bytes_done, bytes_total)
pub type TransferFn<'a> = dyn Fn(u64, u64) + Send + Sync + 'a;

const WRITE_CHUNK: usize = 256 * 1024;

/// Derive the content identifier for a frame: BLAKE3 of the bytes, hex.
pub fn content_id(frame: &[u8]) -> String {
    blake3::hash(frame).to_hex().to_string()
}

fn blob_path(prefix: &str, cid: &str) -> String {
    format!("{prefix}/blobs/{cid}")
}

/// Store an encrypted frame, returning its CID.
///
/// If the store already holds this CID the write is skipped (same content,
/// same address). Progress is reported per written chunk when a callback is
/// supplied.
pub async fn put_frame(
    op: &Operator,
    prefix: &str,
    frame: &[u8],
    progress: Option<&TransferFn<'_>>,
) -> VaultResult<String> {
    let cid = content_id(frame);
    let path = blob_path(prefix, &cid);

    if let Ok(true) = op.exists(&path).await {
        tracing::debug!(cid = %cid, "frame already pinned, skipping upload");
        if let Some(cb) = progress {
            cb(frame.len() as u64, frame.len() as u64);
        }
        return Ok(cid);
    }

    let mut writer = op.writer(&path).await.map_err(write_error)?;

    let total = frame.len() as u64;
    let mut done = 0u64;
    for chunk in frame.chunks(WRITE_CHUNK) {
        writer.write(chunk.to_vec()).await.map_err(write_error)?;
        done += chunk.len() as u64;
        if let Some(cb) = progress {
            cb(done, total);
        }
    }
    writer.close().await.map_err(write_error)?;

    tracing::info!(cid = %cid, bytes = total, "encrypted frame pinned");
    Ok(cid)
}

/// Fetch the encrypted frame for a CID.
pub async fn get_frame(op: &Operator, prefix: &str, cid: &str) -> VaultResult<Vec<u8>> {
    let path = blob_path(prefix, cid);
    let buffer = op.read(&path).await.map_err(|e| read_error(cid, e))?;
    Ok(buffer.to_vec())
}

/// Map a store write failure, keeping authorization failures recognizable:
/// a rejected credential needs a different user action than a flaky network.
fn write_error(e: opendal::Error) -> VaultError {
    if e.kind() == ErrorKind::PermissionDenied {
        VaultError::StoreWriteFailed(format!(
            "store rejected credentials — verify your access key and secret: {e}"
        ))
    } else {
        VaultError::StoreWriteFailed(format!("transport error: {e}"))
    }
}

fn read_error(cid: &str, e: opendal::Error) -> VaultError {
    match e.kind() {
        ErrorKind::NotFound => {
            VaultError::StoreReadFailed(format!("no content pinned at CID {cid}"))
        }
        ErrorKind::PermissionDenied => VaultError::StoreReadFailed(format!(
            "store rejected credentials — verify your access key and secret: {e}"
        )),
        _ => VaultError::StoreReadFailed(format!("transport error: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn memory_operator() -> Operator {
        Operator::new(opendal::services::Memory::default())
            .expect("memory operator")
            .finish()
    }

    #[tokio::test]
    async fn put_get_roundtrip() {
        let op = memory_operator();
        let frame = b"not really ciphertext, but bytes all the same";

        let cid = put_frame(&op, "test", frame, None).await.unwrap();
        let fetched = get_frame(&op, "test", &cid).await.unwrap();

        assert_eq!(fetched, frame);
    }

    #[tokio::test]
    async fn cid_is_deterministic_and_content_derived() {
        let op = memory_operator();

        let cid1 = put_frame(&op, "test", b"same bytes", None).await.unwrap();
        let cid2 = put_frame(&op, "test", b"same bytes", None).await.unwrap();
        let cid3 = put_frame(&op, "test", b"other bytes", None).await.unwrap();

        assert_eq!(cid1, cid2);
        assert_ne!(cid1, cid3);
        assert_eq!(cid1, content_id(b"same bytes"));
    }

    #[tokio::test]
    async fn unknown_cid_is_store_read_failure() {
        let op = memory_operator();
        let err = get_frame(&op, "test", "deadbeef").await.unwrap_err();
        assert!(matches!(err, VaultError::StoreReadFailed(_)));
        assert!(err.to_string().contains("deadbeef"));
    }

    #[tokio::test]
    async fn progress_reaches_total() {
        let op = memory_operator();
        let frame = vec![7u8; WRITE_CHUNK * 2 + 123];
        let last = AtomicU64::new(0);

        let cb = |done: u64, total: u64| {
            assert!(done <= total);
            last.store(done, Ordering::SeqCst);
        };
        put_frame(&op, "test", &frame, Some(&cb)).await.unwrap();

        assert_eq!(last.load(Ordering::SeqCst), frame.len() as u64);
    }
}
