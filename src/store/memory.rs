//! In-memory store used by tests and local experiments.
//!
//! Mirrors the SQLite store's uniqueness contract and adds failure toggles so
//! callers can exercise the audit-swallow and store-outage paths.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::store::{EventKind, StoreError, UserRecord, UserStore};

/// A recorded activity event.
#[derive(Debug, Clone)]
pub struct RecordedEvent {
    pub email: String,
    pub kind: EventKind,
    pub metadata: serde_json::Value,
}

/// HashMap-backed [`UserStore`].
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<String, UserRecord>>,
    events: Mutex<Vec<RecordedEvent>>,
    /// When set, `record_event` fails (audit sink outage).
    fail_events: AtomicBool,
    /// When set, every operation fails (store outage).
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `record_event` fail until cleared.
    pub fn set_fail_events(&self, fail: bool) {
        self.fail_events.store(fail, Ordering::SeqCst);
    }

    /// Make every operation fail until cleared.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Snapshot of recorded events, oldest first.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store offline".to_string()));
        }
        Ok(())
    }
}

impl UserStore for MemoryStore {
    fn put_user(&self, record: &UserRecord) -> Result<(), StoreError> {
        self.check_online()?;
        let mut users = self.users.lock();
        if users.contains_key(&record.email) {
            return Err(StoreError::DuplicateEmail(record.email.clone()));
        }
        users.insert(record.email.clone(), record.clone());
        Ok(())
    }

    fn get_user(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        self.check_online()?;
        Ok(self.users.lock().get(email).cloned())
    }

    fn record_event(
        &self,
        email: &str,
        kind: EventKind,
        metadata: serde_json::Value,
    ) -> Result<(), StoreError> {
        self.check_online()?;
        if self.fail_events.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("audit sink down".to_string()));
        }
        self.events.lock().push(RecordedEvent {
            email: email.to_string(),
            kind,
            metadata,
        });
        Ok(())
    }
}
