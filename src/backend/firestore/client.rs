use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::TokenSource;
use super::codec::{alert_to_document, document_to_alert, Document};
use super::FirestoreConfig;
use crate::alerts::Alert;
use crate::backend::{BackendError, DatabaseBackend};

/// Documents requested per list page
const PAGE_SIZE: u32 = 300;

/// Alert store backed by a Firestore collection
#[derive(Debug, Clone)]
pub struct FirestoreBackend {
    http_client: reqwest::Client,
    collection_url: Url,
    collection: String,
    token_source: Arc<TokenSource>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Error body returned by Google APIs
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorStatus,
}

#[derive(Debug, Deserialize)]
struct ErrorStatus {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl FirestoreBackend {
    pub fn new(config: FirestoreConfig) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let collection_url = Url::parse(&config.collection_url()).map_err(|e| {
            BackendError::InvalidArgument(format!("Invalid Firestore endpoint: {}", e))
        })?;

        Ok(Self {
            http_client,
            collection_url,
            token_source: Arc::new(config.token_source()),
            collection: config.collection,
        })
    }

    async fn request(&self, method: Method, url: Url) -> Result<RequestBuilder, BackendError> {
        let token = self.token_source.token(&self.http_client).await?;
        Ok(self.http_client.request(method, url).bearer_auth(token))
    }

    fn document_url(&self, id: &str) -> Result<Url, BackendError> {
        validate_id(id)?;
        let mut url = self.collection_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidArgument(format!("Invalid alert id: {}", id)))?
            .push(id);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(error_from_body(status, &body))
    }
}

/// Document ids must name exactly one path segment below the collection
fn validate_id(id: &str) -> Result<(), BackendError> {
    if id.is_empty() || id == "." || id == ".." || id.contains('/') {
        return Err(BackendError::InvalidArgument(format!("Invalid alert id: '{}'", id)));
    }
    Ok(())
}

/// Translate a Firestore error response by its gRPC status name
fn error_from_body(status: StatusCode, body: &str) -> BackendError {
    let error = match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) => {
            return BackendError::Remote {
                status: status.to_string(),
                message: body.to_string(),
            }
        }
    };

    match error.status.as_str() {
        "NOT_FOUND" => BackendError::NotFound(error.message),
        "ALREADY_EXISTS" => BackendError::AlreadyExists(error.message),
        "INVALID_ARGUMENT" => BackendError::InvalidArgument(error.message),
        "PERMISSION_DENIED" | "UNAUTHENTICATED" => BackendError::PermissionDenied(error.message),
        "UNAVAILABLE" | "DEADLINE_EXCEEDED" => BackendError::Unavailable(error.message),
        "" => BackendError::Remote {
            status: status.to_string(),
            message: error.message,
        },
        _ => BackendError::Remote {
            status: error.status,
            message: error.message,
        },
    }
}

#[async_trait]
impl DatabaseBackend for FirestoreBackend {
    async fn new_alert(&self, alert: Alert) -> Result<Alert, BackendError> {
        if let Some(id) = alert.id() {
            validate_id(id)?;
        }

        let mut request = self
            .request(Method::POST, self.collection_url.clone())
            .await?
            .json(&alert_to_document(&alert));
        if let Some(id) = alert.id() {
            request = request.query(&[("documentId", id)]);
        }

        let document: Document = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        let created = document_to_alert(document)?;
        tracing::debug!(
            collection = %self.collection,
            alert_id = created.id().unwrap_or_default(),
            "Created alert"
        );
        Ok(created)
    }

    async fn list_alerts(&self) -> Result<Vec<Alert>, BackendError> {
        let mut alerts = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![("pageSize", PAGE_SIZE.to_string())];
            if let Some(token) = page_token.take() {
                params.push(("pageToken", token));
            }

            let request = self
                .request(Method::GET, self.collection_url.clone())
                .await?
                .query(&params);
            let page: ListDocumentsResponse = self
                .send(request)
                .await?
                .json()
                .await
                .map_err(|e| BackendError::Decode(e.to_string()))?;

            for document in page.documents {
                alerts.push(document_to_alert(document)?);
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::debug!(collection = %self.collection, count = alerts.len(), "Listed alerts");
        Ok(alerts)
    }

    async fn delete_alert(&self, id: &str) -> Result<(), BackendError> {
        // Without the precondition Firestore reports success for missing documents
        let request = self
            .request(Method::DELETE, self.document_url(id)?)
            .await?
            .query(&[("currentDocument.exists", "true")]);
        self.send(request).await?;

        tracing::debug!(collection = %self.collection, alert_id = %id, "Deleted alert");
        Ok(())
    }
}
