use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use super::{
    connection::{FindParticipant, RegisterParticipant, SaveScore},
    participant::Participant,
};
use crate::{error::StoreError, phone::Phone};

/// In-memory `"USERS"` table with switchable failures and call counters.
#[derive(Default)]
pub(crate) struct MemoryStore {
    pub(crate) rows: Mutex<HashMap<String, Participant>>,
    pub(crate) fail_lookup: bool,
    pub(crate) fail_insert: bool,
    pub(crate) fail_update: bool,
    /// Hides existing rows from lookups, the way a concurrent insert would.
    pub(crate) stale_lookup: bool,
    pub(crate) lookups: AtomicUsize,
    pub(crate) inserts: AtomicUsize,
    pub(crate) updates: AtomicUsize,
}

impl MemoryStore {
    pub(crate) fn with_participant(self, name: &str, phone: &str) -> Self {
        self.rows.lock().unwrap().insert(
            phone.to_string(),
            Participant {
                phone: phone.to_string(),
                name: name.to_string(),
                scores: None,
            },
        );
        self
    }

    pub(crate) fn get(&self, phone: &str) -> Option<Participant> {
        self.rows.lock().unwrap().get(phone).cloned()
    }

    pub(crate) fn calls(&self) -> (usize, usize, usize) {
        (
            self.lookups.load(Ordering::SeqCst),
            self.inserts.load(Ordering::SeqCst),
            self.updates.load(Ordering::SeqCst),
        )
    }
}

impl FindParticipant for MemoryStore {
    async fn find_participant(&self, phone: &Phone) -> Result<Option<Participant>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookup {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        if self.stale_lookup {
            return Ok(None);
        }

        Ok(self.get(phone.as_str()))
    }
}

impl RegisterParticipant for MemoryStore {
    async fn register_participant(&self, name: &str, phone: &Phone) -> Result<(), StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_insert {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }

        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(phone.as_str()) {
            return Err(StoreError::Duplicate(phone.to_string()));
        }
        rows.insert(
            phone.to_string(),
            Participant {
                phone: phone.to_string(),
                name: name.to_string(),
                scores: None,
            },
        );

        Ok(())
    }
}

impl SaveScore for MemoryStore {
    async fn save_score(&self, phone: &Phone, score: u32) -> Result<u64, StoreError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if self.fail_update {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }

        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(phone.as_str()) {
            Some(row) => {
                row.scores = Some(score as i32);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}
