//! mask-storage: blob store access and durable local state for MaskStore
//!
//! The remote side is any S3-compatible content-addressable store reached
//! through an OpenDAL [`Operator`]; encrypted frames are the only thing
//! ever written to it. The local side is a flat string-keyed JSON file that
//! holds the persisted key material, disclosure flags, and ledger.

pub mod blob;
pub mod kv;
pub mod operator;

pub use blob::{content_id, get_frame, put_frame};
pub use kv::{JsonFileStore, MemoryStore, StringStore};
pub use operator::{build_operator, StoreParams};

pub use opendal::Operator;
