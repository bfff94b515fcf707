//! Convo client: REST binding to the managed bot-model service.
//!
//! One client instance serves every resource kind; the routes differ only in
//! the collection segment the kind declares.

#![forbid(unsafe_code)]

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use tracing::debug;

use convo_core::{Kind, PutReply, ResourceAttrs, StoreError, LATEST_VERSION};
use convo_reconcile::Store;

fn default_endpoint() -> String {
    std::env::var("CONVO_ENDPOINT").unwrap_or_else(|_| "http://127.0.0.1:8930".to_string())
}

fn http_timeout_secs() -> u64 {
    std::env::var("CONVO_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(30)
}

/// HTTP client for the bot-model service.
pub struct RestClient {
    http: reqwest::Client,
    base: String,
    token: Option<String>,
}

impl RestClient {
    /// Build from `CONVO_ENDPOINT` / `CONVO_HTTP_TIMEOUT_SECS` /
    /// `CONVO_API_TOKEN`.
    pub fn from_env() -> Result<Self, StoreError> {
        Self::new(default_endpoint(), std::env::var("CONVO_API_TOKEN").ok())
    }

    pub fn new(base: impl Into<String>, token: Option<String>) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(http_timeout_secs()))
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let base = base.into().trim_end_matches('/').to_string();
        Ok(Self { http, base, token })
    }

    fn authed(&self, rb: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => rb.bearer_auth(token),
            None => rb,
        }
    }

    async fn read_failure(resp: Response) -> StoreError {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        error_for(status, &body)
    }
}

/// Map an HTTP failure status to the store error taxonomy.
fn error_for(status: StatusCode, body: &str) -> StoreError {
    let detail = if body.is_empty() { status.to_string() } else { format!("{status}: {body}") };
    match status {
        StatusCode::NOT_FOUND => StoreError::NotFound(detail),
        StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => StoreError::Conflict(detail),
        _ => StoreError::Remote(detail),
    }
}

fn version_url(base: &str, collection: &str, name: &str, version_or_alias: &str) -> String {
    format!("{}/{}/{}/versions/{}", base, collection, encode(name), encode(version_or_alias))
}

fn resource_url(base: &str, collection: &str, name: &str) -> String {
    format!("{}/{}/{}", base, collection, encode(name))
}

fn encode(segment: &str) -> String {
    // Names are caller-controlled; escape what would break the path.
    segment.replace('%', "%25").replace('/', "%2F").replace('$', "%24")
}

#[async_trait]
impl<K: Kind> Store<K> for RestClient {
    async fn put(&self, name: &str, req: &K::PutRequest) -> Result<PutReply, StoreError> {
        let url = version_url(&self.base, K::COLLECTION, name, LATEST_VERSION);
        debug!(kind = K::KIND, url = %url, "put");
        let resp = self
            .authed(self.http.put(&url).json(req))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Self::read_failure(resp).await);
        }
        resp.json::<PutReply>().await.map_err(|e| StoreError::Transport(e.to_string()))
    }

    async fn get(&self, name: &str, version_or_alias: &str) -> Result<ResourceAttrs, StoreError> {
        let url = version_url(&self.base, K::COLLECTION, name, version_or_alias);
        debug!(kind = K::KIND, url = %url, "get");
        let resp = self
            .authed(self.http.get(&url))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Self::read_failure(resp).await);
        }
        resp.json::<ResourceAttrs>().await.map_err(|e| StoreError::Transport(e.to_string()))
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        let url = resource_url(&self.base, K::COLLECTION, name);
        debug!(kind = K::KIND, url = %url, "delete");
        let resp = self
            .authed(self.http.delete(&url))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(Self::read_failure(resp).await);
        }
        Ok(())
    }
}
