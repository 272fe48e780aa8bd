//! Vault key lifecycle: generate once, disclose once, load forever
//!
//! State machine, persisted as the legacy flag pair plus key material:
//!
//! ```text
//! NoKey ──ensure_key──▶ GeneratedUndisclosed ──(same call)──▶ GeneratedDisclosed
//!   ▲                                                              │
//!   └────────────────────── reset() ◀─────────────────────────────┘
//! ```
//!
//! The plaintext key string leaves this module exactly once per generation,
//! as the return value of the `ensure_key` call that spent the disclosure.
//! After that the system assumes possession only; there is no recovery path.

use secrecy::{ExposeSecret, SecretString};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mask_core::types::KeyState;
use mask_core::{VaultError, VaultResult};
use mask_crypto::{generate_vault_key, operator_key_from_base64, VaultKey};
use mask_storage::StringStore;

/// Storage key for the base64 key material
pub const KEY_STORAGE: &str = "maskStoreKey";
/// Storage key for the "a key has been generated" flag
pub const KEY_GENERATED_FLAG: &str = "maskStoreKeyGenerated";
/// Storage key for the "the key has been shown to the user" flag
pub const KEY_SHOWN_FLAG: &str = "maskStoreKeyShown";

/// Owner of the persisted vault key and its disclosure flag.
///
/// All transitions happen under one mutex, so two concurrent first-time
/// callers cannot both generate a key: the second caller re-reads state
/// after acquiring the lock and sees the first caller's write.
pub struct KeyVault<S: StringStore> {
    store: Arc<Mutex<S>>,
}

impl<S: StringStore> KeyVault<S> {
    pub fn new(store: Arc<Mutex<S>>) -> Self {
        Self { store }
    }

    fn lock(&self) -> MutexGuard<'_, S> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current key lifecycle state.
    pub fn state(&self) -> VaultResult<KeyState> {
        let store = self.lock();
        Self::state_locked(&*store)
    }

    fn state_locked(store: &S) -> VaultResult<KeyState> {
        if store.get(KEY_GENERATED_FLAG)?.is_none() {
            Ok(KeyState::NoKey)
        } else if store.get(KEY_SHOWN_FLAG)?.is_none() {
            Ok(KeyState::GeneratedUndisclosed)
        } else {
            Ok(KeyState::GeneratedDisclosed)
        }
    }

    /// Make sure a vault key exists, generating and persisting one on first
    /// call. Returns the encoded key for one-time display if (and only if)
    /// the disclosure has not been spent yet; every later call returns
    /// `None` and mutates nothing.
    pub fn ensure_key(&self) -> VaultResult<Option<SecretString>> {
        let mut store = self.lock();

        // Re-read under the lock: a concurrent caller may have generated
        // between our caller's decision to run setup and now.
        match Self::state_locked(&*store)? {
            KeyState::NoKey => {
                let key = generate_vault_key();
                let encoded = key.to_base64();
                store.set(KEY_STORAGE, encoded.expose_secret())?;
                store.set(KEY_GENERATED_FLAG, "true")?;
                store.set(KEY_SHOWN_FLAG, "true")?;
                tracing::info!("vault key generated; disclosing once");
                Ok(Some(encoded))
            }
            // A crash between the generated and shown writes leaves the key
            // undisclosed; the disclosure is still owed.
            KeyState::GeneratedUndisclosed => {
                let encoded = store.get(KEY_STORAGE)?.ok_or_else(|| {
                    VaultError::State("key marked generated but no key material stored".into())
                })?;
                store.set(KEY_SHOWN_FLAG, "true")?;
                tracing::info!("disclosing previously generated vault key");
                Ok(Some(SecretString::from(encoded)))
            }
            KeyState::GeneratedDisclosed => Ok(None),
        }
    }

    /// Load the persisted key as an encryption handle.
    ///
    /// Fails with [`VaultError::KeyUnavailable`] if no key has ever been
    /// generated — this never auto-generates, so a caller that skipped
    /// setup finds out instead of silently minting a key nobody saw.
    pub fn load_key_for_encryption(&self) -> VaultResult<VaultKey> {
        let encoded = {
            let store = self.lock();
            store.get(KEY_STORAGE)?.ok_or(VaultError::KeyUnavailable)?
        };

        // The persisted form is our own write; failure here means the
        // state file was damaged, not that the user typed a bad key.
        operator_key_from_base64(&SecretString::from(encoded)).map_err(|e| {
            VaultError::State(format!("persisted vault key is unreadable: {e}"))
        })
    }

    /// Administrative reset: forget the key and both flags. Every entry
    /// sealed under the old key becomes permanently unreadable, which is
    /// why nothing calls this except the explicit reset flow.
    pub fn reset(&self) -> VaultResult<()> {
        let mut store = self.lock();
        store.remove(KEY_STORAGE)?;
        store.remove(KEY_GENERATED_FLAG)?;
        store.remove(KEY_SHOWN_FLAG)?;
        tracing::warn!("vault key state cleared; previously sealed entries are orphaned");
        Ok(())
    }
}
