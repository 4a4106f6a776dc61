//! Alert record type

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON member holding the identifier. Never an application field.
pub const ID_FIELD: &str = "id";

/// An inventory alert record
///
/// Everything except `id` is application-defined and stored verbatim, so the
/// JSON form is `{"id": "...", ...fields}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Backend-assigned identifier. Absent on create requests unless the
    /// caller wants to pick the id itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Application-defined fields
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Alert {
    /// Create an empty alert without an id
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the identifier
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add an application-defined field. `id` is ignored; use [`Alert::with_id`].
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        if name != ID_FIELD {
            self.fields.insert(name, value.into());
        }
        self
    }

    /// The identifier, treating an empty string as unset
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}
