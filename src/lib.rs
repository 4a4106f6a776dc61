//! Inventory Alerts: the Alert resource API of the inventory web app
//!
//! A thin HTTP layer that creates, lists and deletes alerts, passing each
//! request straight to a [`DatabaseBackend`]. Firestore is the production
//! store; an in-memory store covers local runs and tests.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use inventory_alerts::api::{build_router, AppState};
//! use inventory_alerts::backend::MemoryBackend;
//!
//! let state = Arc::new(AppState::new(Arc::new(MemoryBackend::new())));
//! let app = build_router(state);
//! ```

pub mod alerts;
pub mod api;
pub mod backend;
pub mod config;

// Re-export commonly used types
pub use alerts::Alert;
pub use backend::{BackendError, DatabaseBackend};
pub use config::{AppConfig, ConfigError};
