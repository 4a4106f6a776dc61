//! Access tokens for Firestore requests
//!
//! A configured token is used as-is. Without one, tokens for the instance's
//! default service account come from the GCE/Cloud Run metadata server and are
//! cached until shortly before they expire.

use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::backend::BackendError;

/// Metadata server endpoint for the default service account token
pub const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Refresh this long before the reported expiry
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub enum TokenSource {
    Static(String),
    Metadata(MetadataTokenSource),
}

impl TokenSource {
    /// Current bearer token
    pub async fn token(&self, client: &reqwest::Client) -> Result<String, BackendError> {
        match self {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::Metadata(source) => source.token(client).await,
        }
    }
}

#[derive(Debug)]
pub struct MetadataTokenSource {
    url: String,
    cached: Mutex<Option<CachedToken>>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    refresh_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

impl MetadataTokenSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cached: Mutex::new(None),
        }
    }

    async fn token(&self, client: &reqwest::Client) -> Result<String, BackendError> {
        // Held across the fetch so concurrent requests share one refresh
        let mut cached = self.cached.lock().await;
        if let Some(current) = cached.as_ref() {
            if Instant::now() < current.refresh_at {
                return Ok(current.token.clone());
            }
        }

        let fetched = self.fetch(client).await?;
        let token = fetched.access_token.clone();
        *cached = Some(fetched.into_cached());
        Ok(token)
    }

    async fn fetch(&self, client: &reqwest::Client) -> Result<TokenResponse, BackendError> {
        let response = client
            .get(&self.url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| BackendError::Network(format!("Metadata server unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(BackendError::Unavailable(format!(
                "Metadata server returned status {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(format!("Invalid metadata token response: {}", e)))?;

        tracing::debug!(expires_in = token.expires_in, "Fetched access token from metadata server");
        Ok(token)
    }
}

impl TokenResponse {
    fn into_cached(self) -> CachedToken {
        let lifetime = Duration::from_secs(self.expires_in).saturating_sub(REFRESH_MARGIN);
        CachedToken {
            token: self.access_token,
            refresh_at: Instant::now() + lifetime,
        }
    }
}
