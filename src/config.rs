//! Service configuration from environment variables
//!
//! - INVENTORY_HOST: Bind address (default: 0.0.0.0)
//! - INVENTORY_PORT: Port number, falling back to PORT (default: 8080)
//! - PROJECT_ID: Firestore project (required unless INVENTORY_BACKEND=memory)
//! - INVENTORY_BACKEND: `firestore` or `memory` (default: firestore)
//! - INVENTORY_ALERTS_COLLECTION: Firestore collection (default: alerts)
//! - INVENTORY_REQUEST_TIMEOUT_SECS: Firestore request timeout (default: 30)
//! - FIRESTORE_EMULATOR_HOST: Emulator host:port
//! - GOOGLE_OAUTH_ACCESS_TOKEN: Bearer token for Firestore (default: fetched
//!   from the metadata server)

use std::sync::Arc;
use std::time::Duration;

use crate::api::ServerConfig;
use crate::backend::{BackendError, DatabaseBackend, FirestoreBackend, FirestoreConfig, MemoryBackend};

/// Which store backs the alerts API
#[derive(Debug, Clone)]
pub enum BackendConfig {
    Memory,
    Firestore(FirestoreConfig),
}

impl BackendConfig {
    pub fn name(&self) -> &'static str {
        match self {
            BackendConfig::Memory => "memory",
            BackendConfig::Firestore(_) => "firestore",
        }
    }

    /// Construct the configured backend
    pub fn build(&self) -> Result<Arc<dyn DatabaseBackend>, BackendError> {
        match self {
            BackendConfig::Memory => Ok(Arc::new(MemoryBackend::new())),
            BackendConfig::Firestore(config) => Ok(Arc::new(FirestoreBackend::new(config.clone())?)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Unset and empty are treated the same
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let defaults = ServerConfig::default();
        let host = var("INVENTORY_HOST").unwrap_or(defaults.host);
        let port = match var("INVENTORY_PORT").or_else(|| var("PORT")) {
            Some(p) => p
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid("INVENTORY_PORT", p))?,
            None => defaults.port,
        };

        let project_id = var("PROJECT_ID");
        let kind = var("INVENTORY_BACKEND").unwrap_or_else(|| "firestore".to_string());

        let backend = match kind.trim().to_ascii_lowercase().as_str() {
            "memory" => BackendConfig::Memory,
            "firestore" => {
                let project_id = project_id.ok_or(ConfigError::Missing("PROJECT_ID"))?;
                let mut firestore = FirestoreConfig::new(project_id);

                if let Some(collection) = var("INVENTORY_ALERTS_COLLECTION") {
                    firestore = firestore.with_collection(collection);
                }
                if let Some(secs) = var("INVENTORY_REQUEST_TIMEOUT_SECS") {
                    let secs = secs
                        .trim()
                        .parse::<u64>()
                        .map_err(|_| ConfigError::Invalid("INVENTORY_REQUEST_TIMEOUT_SECS", secs))?;
                    firestore = firestore.with_timeout(Duration::from_secs(secs));
                }
                if let Some(token) = var("GOOGLE_OAUTH_ACCESS_TOKEN") {
                    firestore = firestore.with_access_token(token);
                }
                // The emulator ignores real credentials
                if let Some(emulator) = var("FIRESTORE_EMULATOR_HOST") {
                    firestore = firestore.with_emulator(emulator.trim());
                }

                BackendConfig::Firestore(firestore)
            }
            _ => return Err(ConfigError::Invalid("INVENTORY_BACKEND", kind)),
        };

        Ok(Self {
            server: ServerConfig { host, port },
            backend,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: '{1}'")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("PROJECT_ID", "demo")]).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert!(matches!(config.backend, BackendConfig::Firestore(_)));
    }

    #[test]
    fn test_missing_project_id() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("PROJECT_ID")));

        // Memory is only used when asked for
        let config = load(&[("INVENTORY_BACKEND", "memory")]).unwrap();
        assert!(matches!(config.backend, BackendConfig::Memory));
    }

    #[test]
    fn test_project_id_selects_firestore() {
        let config = load(&[("PROJECT_ID", "inventory-prod")]).unwrap();
        match config.backend {
            BackendConfig::Firestore(firestore) => {
                assert_eq!(firestore.project_id, "inventory-prod");
                assert_eq!(firestore.collection, "alerts");
                assert_eq!(firestore.timeout, Duration::from_secs(30));
                assert!(firestore.access_token.is_none());
            }
            other => panic!("unexpected backend: {:?}", other),
        }
    }

    #[test]
    fn test_firestore_overrides() {
        let config = load(&[
            ("PROJECT_ID", "demo"),
            ("INVENTORY_ALERTS_COLLECTION", "staging_alerts"),
            ("INVENTORY_REQUEST_TIMEOUT_SECS", "5"),
            ("FIRESTORE_EMULATOR_HOST", "localhost:8681"),
        ])
        .unwrap();

        let BackendConfig::Firestore(firestore) = config.backend else {
            panic!("expected firestore backend");
        };
        assert_eq!(firestore.collection, "staging_alerts");
        assert_eq!(firestore.timeout, Duration::from_secs(5));
        assert_eq!(firestore.endpoint, "http://localhost:8681");
        assert_eq!(firestore.access_token.as_deref(), Some("owner"));
    }

    #[test]
    fn test_port_fallback() {
        let config = load(&[("PROJECT_ID", "demo"), ("PORT", "9090")]).unwrap();
        assert_eq!(config.server.port, 9090);

        let config = load(&[
            ("PROJECT_ID", "demo"),
            ("PORT", "9090"),
            ("INVENTORY_PORT", "7070"),
        ])
        .unwrap();
        assert_eq!(config.server.port, 7070);
    }

    #[test]
    fn test_invalid_values() {
        let err = load(&[("PROJECT_ID", "demo"), ("INVENTORY_PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("INVENTORY_PORT", _)));

        let err = load(&[("INVENTORY_BACKEND", "postgres")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("INVENTORY_BACKEND", _)));

        let err = load(&[("INVENTORY_BACKEND", "firestore")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("PROJECT_ID")));
    }

    #[test]
    fn test_memory_backend_ignores_project() {
        let config = load(&[("PROJECT_ID", "demo"), ("INVENTORY_BACKEND", "memory")]).unwrap();
        assert!(matches!(config.backend, BackendConfig::Memory));
        assert!(config.backend.build().is_ok());
    }
}
