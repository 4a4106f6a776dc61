//! Database backends for the Alert resource
//!
//! The API layer only sees [`DatabaseBackend`]; which store sits behind it is
//! decided once at startup.

pub mod firestore;
pub mod memory;

pub use firestore::{FirestoreBackend, FirestoreConfig};
pub use memory::MemoryBackend;

use async_trait::async_trait;

use crate::alerts::Alert;

/// Storage operations for alerts
#[async_trait]
pub trait DatabaseBackend: Send + Sync {
    /// Create an alert and return the stored record, id included
    async fn new_alert(&self, alert: Alert) -> Result<Alert, BackendError>;

    /// List every alert, in backend order
    async fn list_alerts(&self) -> Result<Vec<Alert>, BackendError>;

    /// Delete an alert by id
    async fn delete_alert(&self, id: &str) -> Result<(), BackendError>;
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend error ({status}): {message}")]
    Remote { status: String, message: String },

    #[error("Decode error: {0}")]
    Decode(String),
}
