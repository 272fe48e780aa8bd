//! Bounded vault ledger: the most recent five sealed entries
//!
//! Persisted as a single JSON array string under the `uploads` key,
//! most-recent-last. Append is a serialized read-modify-write: without the
//! mutex, two concurrent uploads could each read a four-entry ledger and
//! both persist a five-entry one, losing an entry.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mask_core::types::VaultEntry;
use mask_core::{VaultError, VaultResult};
use mask_storage::StringStore;

/// Storage key for the serialized ledger
pub const LEDGER_KEY: &str = "uploads";

/// Maximum number of entries the ledger retains
pub const LEDGER_CAP: usize = 5;

/// Owner of the persisted entry records.
pub struct VaultLedger<S: StringStore> {
    store: Arc<Mutex<S>>,
}

impl<S: StringStore> VaultLedger<S> {
    pub fn new(store: Arc<Mutex<S>>) -> Self {
        Self { store }
    }

    fn lock(&self) -> MutexGuard<'_, S> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_locked(store: &S) -> VaultResult<Vec<VaultEntry>> {
        match store.get(LEDGER_KEY)? {
            None => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| VaultError::State(format!("unreadable ledger: {e}"))),
        }
    }

    fn write_locked(store: &mut S, entries: &[VaultEntry]) -> VaultResult<()> {
        let raw = serde_json::to_string(entries)
            .map_err(|e| VaultError::State(format!("serializing ledger: {e}")))?;
        store.set(LEDGER_KEY, &raw)
    }

    /// Read-only snapshot, insertion-ordered (oldest first).
    pub fn list(&self) -> VaultResult<Vec<VaultEntry>> {
        let store = self.lock();
        Self::read_locked(&*store)
    }

    pub fn len(&self) -> VaultResult<usize> {
        Ok(self.list()?.len())
    }

    pub fn is_full(&self) -> VaultResult<bool> {
        Ok(self.len()? >= LEDGER_CAP)
    }

    /// Find the entry recorded for a CID. Entries are addressed by CID,
    /// never by position: eviction renumbers positions under callers.
    pub fn find(&self, cid: &str) -> VaultResult<Option<VaultEntry>> {
        Ok(self.list()?.into_iter().find(|e| e.cid == cid))
    }

    /// Insert at the end, then truncate to the last [`LEDGER_CAP`] entries
    /// by dropping from the front — strictly FIFO, never any other
    /// eviction criterion.
    pub fn append(&self, entry: VaultEntry) -> VaultResult<()> {
        let mut store = self.lock();
        let mut entries = Self::read_locked(&*store)?;
        entries.push(entry);
        if entries.len() > LEDGER_CAP {
            let excess = entries.len() - LEDGER_CAP;
            entries.drain(..excess);
        }
        Self::write_locked(&mut *store, &entries)
    }

    /// Insert only if a slot is free; a full ledger refuses with
    /// [`VaultError::LedgerFull`] instead of evicting. Check and insert
    /// happen under one lock, so two callers racing for the last slot
    /// cannot both get it.
    pub fn try_append(&self, entry: VaultEntry) -> VaultResult<()> {
        let mut store = self.lock();
        let mut entries = Self::read_locked(&*store)?;
        if entries.len() >= LEDGER_CAP {
            return Err(VaultError::LedgerFull { cap: LEDGER_CAP });
        }
        entries.push(entry);
        Self::write_locked(&mut *store, &entries)
    }

    /// Administrative wipe; pairs with the key reset, not with any normal
    /// upload/retrieval flow.
    pub fn clear(&self) -> VaultResult<()> {
        let mut store = self.lock();
        store.remove(LEDGER_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mask_storage::MemoryStore;

    fn ledger() -> VaultLedger<MemoryStore> {
        VaultLedger::new(Arc::new(Mutex::new(MemoryStore::new())))
    }

    fn entry(n: usize) -> VaultEntry {
        VaultEntry {
            name: format!("file-{n}.txt"),
            cid: format!("cid-{n}"),
            mime: "text/plain".into(),
        }
    }

    #[test]
    fn empty_ledger_lists_nothing() {
        let l = ledger();
        assert!(l.list().unwrap().is_empty());
        assert!(!l.is_full().unwrap());
    }

    #[test]
    fn append_preserves_insertion_order() {
        let l = ledger();
        for n in 0..3 {
            l.append(entry(n)).unwrap();
        }
        let names: Vec<_> = l.list().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, ["file-0.txt", "file-1.txt", "file-2.txt"]);
    }

    #[test]
    fn sixth_append_evicts_the_first_only() {
        let l = ledger();
        for n in 0..6 {
            l.append(entry(n)).unwrap();
        }

        let cids: Vec<_> = l.list().unwrap().into_iter().map(|e| e.cid).collect();
        assert_eq!(cids, ["cid-1", "cid-2", "cid-3", "cid-4", "cid-5"]);
    }

    #[test]
    fn ledger_never_exceeds_cap() {
        let l = ledger();
        for n in 0..20 {
            l.append(entry(n)).unwrap();
            assert!(l.len().unwrap() <= LEDGER_CAP);
        }
        assert_eq!(l.len().unwrap(), LEDGER_CAP);
    }

    #[test]
    fn find_by_cid() {
        let l = ledger();
        for n in 0..3 {
            l.append(entry(n)).unwrap();
        }

        let found = l.find("cid-1").unwrap().unwrap();
        assert_eq!(found.name, "file-1.txt");
        assert!(l.find("cid-99").unwrap().is_none());
    }

    #[test]
    fn try_append_refuses_at_cap_without_evicting() {
        let l = ledger();
        for n in 0..LEDGER_CAP {
            l.try_append(entry(n)).unwrap();
        }

        let err = l.try_append(entry(99)).unwrap_err();
        assert!(matches!(err, VaultError::LedgerFull { cap: LEDGER_CAP }));

        let cids: Vec<_> = l.list().unwrap().into_iter().map(|e| e.cid).collect();
        assert_eq!(cids, ["cid-0", "cid-1", "cid-2", "cid-3", "cid-4"]);
    }

    #[test]
    fn racing_try_appends_for_the_last_slot_admit_exactly_one() {
        let l = Arc::new(ledger());
        for n in 0..LEDGER_CAP - 1 {
            l.try_append(entry(n)).unwrap();
        }

        let handles: Vec<_> = (0..2)
            .map(|n| {
                let l = Arc::clone(&l);
                std::thread::spawn(move || l.try_append(entry(90 + n)))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(VaultError::LedgerFull { .. }))));
        assert_eq!(l.len().unwrap(), LEDGER_CAP);
        assert_eq!(l.list().unwrap()[0].cid, "cid-0", "nothing may be evicted");
    }

    #[test]
    fn concurrent_appends_lose_nothing_under_cap() {
        let l = Arc::new(ledger());
        let handles: Vec<_> = (0..4)
            .map(|n| {
                let l = Arc::clone(&l);
                std::thread::spawn(move || l.append(entry(n)).unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let entries = l.list().unwrap();
        assert_eq!(entries.len(), 4, "no append may be lost below the cap");
    }

    #[test]
    fn clear_empties_the_ledger() {
        let l = ledger();
        for n in 0..3 {
            l.append(entry(n)).unwrap();
        }
        l.clear().unwrap();
        assert!(l.list().unwrap().is_empty());
    }

    #[test]
    fn corrupt_ledger_is_a_state_error() {
        let store = Arc::new(Mutex::new(MemoryStore::new()));
        store.lock().unwrap().set(LEDGER_KEY, "[{broken").unwrap();

        let l = VaultLedger::new(store);
        assert!(matches!(l.list().unwrap_err(), VaultError::State(_)));
    }
}
