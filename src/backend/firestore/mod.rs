//! Firestore backend over the REST API (v1)

pub mod auth;
pub mod client;
pub mod codec;

pub use auth::{TokenSource, METADATA_TOKEN_URL};
pub use client::FirestoreBackend;

use std::time::Duration;

/// Public Firestore endpoint
pub const DEFAULT_ENDPOINT: &str = "https://firestore.googleapis.com";

/// Credential the emulator accepts in place of a real token
const EMULATOR_TOKEN: &str = "owner";

/// Firestore connection settings
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub project_id: String,
    /// Collection holding alert documents
    pub collection: String,
    /// Scheme and host, e.g. `https://firestore.googleapis.com`
    pub endpoint: String,
    /// OAuth access token sent as a bearer token. When unset, tokens come
    /// from the metadata server.
    pub access_token: Option<String>,
    pub metadata_url: String,
    pub timeout: Duration,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            collection: "alerts".to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            access_token: None,
            metadata_url: METADATA_TOKEN_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Point at a local emulator (`FIRESTORE_EMULATOR_HOST`, e.g. `localhost:8681`)
    pub fn with_emulator(mut self, host: &str) -> Self {
        self.endpoint = format!("http://{}", host);
        self.access_token = Some(EMULATOR_TOKEN.to_string());
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_metadata_url(mut self, url: impl Into<String>) -> Self {
        self.metadata_url = url.into();
        self
    }

    /// Where request credentials come from
    pub fn token_source(&self) -> TokenSource {
        match &self.access_token {
            Some(token) => TokenSource::Static(token.clone()),
            None => TokenSource::Metadata(auth::MetadataTokenSource::new(self.metadata_url.clone())),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// URL of the alerts collection
    pub fn collection_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents/{}",
            self.endpoint.trim_end_matches('/'),
            self.project_id,
            self.collection
        )
    }
}
