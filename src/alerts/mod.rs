//! The Alert resource
//!
//! Alerts are opaque records owned by the database backend: an identifier
//! plus whatever application-defined fields the inventory app attaches.

pub mod model;

pub use model::{Alert, ID_FIELD};
