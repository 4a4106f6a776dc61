//! In-process alert store
//!
//! Used for local development and tests when no Firestore project is
//! configured. Nothing survives a restart.

use async_trait::async_trait;
use dashmap::DashMap;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{BackendError, DatabaseBackend};
use crate::alerts::Alert;

/// Length of generated ids, matching Firestore auto-ids
const AUTO_ID_LEN: usize = 20;

struct StoredAlert {
    /// Creation sequence, used to list in insertion order
    seq: u64,
    alert: Alert,
}

pub struct MemoryBackend {
    alerts: DashMap<String, StoredAlert>,
    next_seq: AtomicU64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            alerts: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    fn auto_id() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(AUTO_ID_LEN)
            .map(char::from)
            .collect()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseBackend for MemoryBackend {
    async fn new_alert(&self, mut alert: Alert) -> Result<Alert, BackendError> {
        let id = match alert.id() {
            Some(id) => id.to_string(),
            None => Self::auto_id(),
        };

        match self.alerts.entry(id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(BackendError::AlreadyExists(format!("alert {} already exists", id)))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                alert.id = Some(id);
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                slot.insert(StoredAlert {
                    seq,
                    alert: alert.clone(),
                });
                Ok(alert)
            }
        }
    }

    async fn list_alerts(&self) -> Result<Vec<Alert>, BackendError> {
        let mut stored: Vec<(u64, Alert)> = self
            .alerts
            .iter()
            .map(|e| (e.value().seq, e.value().alert.clone()))
            .collect();
        stored.sort_by_key(|(seq, _)| *seq);

        Ok(stored.into_iter().map(|(_, alert)| alert).collect())
    }

    async fn delete_alert(&self, id: &str) -> Result<(), BackendError> {
        if self.alerts.remove(id).is_none() {
            return Err(BackendError::NotFound(format!("alert {} not found", id)));
        }
        Ok(())
    }
}
