//! Per-key download reservations
//!
//! A reservation is an exclusive, async lock on one cache key plus a small
//! record describing the in-flight download. Concurrent fetches of the same
//! month queue on the lock, so at most one of them touches the network;
//! the record disappears when the guard is dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

use crate::app::models::CacheKey;

/// State of an in-flight reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReservationState {
    /// Lock held, nothing written yet
    Reserved,
    /// Response body is being streamed to the temporary file
    Downloading,
    /// Temporary file complete, being renamed into place
    Publishing,
}

/// Information about an active reservation
#[derive(Debug, Clone, Serialize)]
pub struct ReservationInfo {
    /// Identifier of the fetch holding the lock
    pub fetch_id: u32,
    /// Month being fetched
    pub key: CacheKey,
    /// When the lock was acquired
    pub reserved_at: DateTime<Utc>,
    /// Current state
    pub status: ReservationState,
}

type ReservationMap = Arc<Mutex<HashMap<CacheKey, ReservationInfo>>>;

/// Lock table shared by every fetch against one cache
#[derive(Debug, Default)]
pub(crate) struct KeyLocks {
    locks: Mutex<HashMap<CacheKey, Arc<AsyncMutex<()>>>>,
    reservations: ReservationMap,
    next_id: Mutex<u32>,
}

impl KeyLocks {
    /// Wait for exclusive access to `key`
    pub(crate) async fn acquire(&self, key: CacheKey) -> KeyGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry(key)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        let guard = lock.lock_owned().await;
        let fetch_id = self.generate_id();

        let info = ReservationInfo {
            fetch_id,
            key,
            reserved_at: Utc::now(),
            status: ReservationState::Reserved,
        };
        self.reservations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, info);

        debug!("Reserved {} for fetch {}", key, fetch_id);
        KeyGuard {
            key,
            fetch_id,
            reservations: Arc::clone(&self.reservations),
            _guard: guard,
        }
    }

    /// Snapshot of all active reservations
    pub(crate) fn active(&self) -> Vec<ReservationInfo> {
        let reservations = self.reservations.lock().unwrap_or_else(|e| e.into_inner());
        let mut active: Vec<_> = reservations.values().cloned().collect();
        active.sort_by_key(|r| r.key);
        active
    }

    fn generate_id(&self) -> u32 {
        let mut next = self.next_id.lock().unwrap_or_else(|e| e.into_inner());
        *next = next.wrapping_add(1);
        if *next == 0 {
            *next = 1; // Skip 0
        }
        *next
    }
}

/// Exclusive hold on one cache key; releases the reservation on drop
#[derive(Debug)]
pub struct KeyGuard {
    key: CacheKey,
    fetch_id: u32,
    reservations: ReservationMap,
    _guard: OwnedMutexGuard<()>,
}

impl KeyGuard {
    pub fn key(&self) -> CacheKey {
        self.key
    }

    pub fn fetch_id(&self) -> u32 {
        self.fetch_id
    }

    /// Record a state transition for this reservation
    pub fn set_state(&self, status: ReservationState) {
        let mut reservations = self.reservations.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(info) = reservations.get_mut(&self.key) {
            info.status = status;
        }
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        let mut reservations = self.reservations.lock().unwrap_or_else(|e| e.into_inner());
        if reservations
            .get(&self.key)
            .is_some_and(|r| r.fetch_id == self.fetch_id)
        {
            reservations.remove(&self.key);
        }
    }
}
