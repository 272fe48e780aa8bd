use thiserror::Error;

pub type VaultResult<T> = Result<T, VaultError>;

/// Every failure the vault core can surface. All variants are terminal for
/// the operation in progress; none should ever panic the surrounding
/// application.
///
/// The decrypt-side variants are deliberately disjoint from the store-side
/// ones: an AEAD tag failure means "wrong key or altered content" (remedy:
/// re-enter the key), while a store authorization failure means "fix your
/// credentials". Conflating them sends the user down the wrong path.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Encryption was attempted before any key exists. Never auto-generates
    /// a key mid-upload; the caller must run key setup first.
    #[error("no vault key has been generated yet — run key setup first")]
    KeyUnavailable,

    /// The operator-supplied key string is not valid base64 or does not
    /// decode to a 256-bit key.
    #[error("invalid decryption key: {0}")]
    MalformedKey(String),

    /// An encrypted frame shorter than the 12-byte nonce prefix. Rejected
    /// before any AEAD operation is attempted.
    #[error("encrypted frame too short: {len} bytes (minimum 12)")]
    FrameTooShort { len: usize },

    /// The AEAD tag check failed: the key doesn't match this content, or
    /// the content was altered in transit or at rest.
    #[error("decryption failed: the key doesn't match this content or the content was altered")]
    AuthenticationFailed,

    /// Binary payload exceeds the upload cap.
    #[error("payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    /// Text note exceeds the character cap (checked before encoding).
    #[error("note of {chars} characters exceeds the {limit} character limit")]
    NoteTooLong { chars: usize, limit: usize },

    /// The ledger already holds its maximum number of entries. The pipeline
    /// never evicts on its own; the user must reset explicitly.
    #[error("vault ledger is full ({cap} entries) — remove content before adding more")]
    LedgerFull { cap: usize },

    /// Writing to the remote blob store failed. The message distinguishes
    /// authorization failures from generic transport failures.
    #[error("storing encrypted content failed: {0}")]
    StoreWriteFailed(String),

    /// Fetching from the remote blob store failed (transport error or
    /// unknown CID).
    #[error("fetching encrypted content failed: {0}")]
    StoreReadFailed(String),

    /// The durable string store holds data this version cannot parse.
    #[error("vault state error: {0}")]
    State(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
