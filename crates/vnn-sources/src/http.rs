//! Shared HTTP plumbing for sources.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use tracing::{trace, warn};
use url::Url;

use crate::error::{SourceError, SourceResult};

/// HTTP settings shared by every source of a run.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    pub user_agent: String,
}

impl HttpConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 25;

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("vnn-events/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// A thin GET-only client with uniform status handling.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> SourceResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                SourceError::network(format!("failed to create HTTP client: {}", e)).with_cause(e)
            })?;
        Ok(Self { client })
    }

    /// GETs `url` and returns the body of a 200 response.
    pub async fn get_text(&self, url: &Url, bearer: Option<&str>) -> SourceResult<String> {
        let mut request = self.client.get(url.clone());
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        trace!(url = %redact(url), "Sending request");

        let response = request
            .send()
            .await
            .map_err(|e| SourceError::network(format!("request failed: {}", e)).with_cause(e))?;

        handle_response(response).await
    }

    /// GETs `url` and parses the body as JSON.
    pub async fn get_json(
        &self,
        url: &Url,
        bearer: Option<&str>,
    ) -> SourceResult<serde_json::Value> {
        let body = self.get_text(url, bearer).await?;
        serde_json::from_str(&body).map_err(|e| {
            SourceError::invalid_response(format!("response is not JSON: {}", e)).with_cause(e)
        })
    }
}

async fn handle_response(response: Response) -> SourceResult<String> {
    let status = response.status();
    trace!(status = %status, "Received response");

    match status {
        StatusCode::OK => response
            .text()
            .await
            .map_err(|e| SourceError::network(format!("failed to read response: {}", e))),
        StatusCode::UNAUTHORIZED => Err(SourceError::authentication(
            "authentication failed: token missing or rejected",
        )),
        StatusCode::FORBIDDEN => Err(SourceError::authorization("access denied")),
        StatusCode::NOT_FOUND => Err(SourceError::not_found("resource not found")),
        StatusCode::TOO_MANY_REQUESTS => Err(SourceError::rate_limited("too many requests")),
        s if s.is_server_error() => {
            let body = response.text().await.unwrap_or_default();
            Err(SourceError::server(format!(
                "server error ({}): {}",
                s,
                truncate(&body)
            )))
        }
        s => {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %s, body = %truncate(&body), "Unexpected response status");
            Err(SourceError::invalid_response(format!(
                "unexpected status {}: {}",
                s,
                truncate(&body)
            )))
        }
    }
}

/// Hides credential-looking query parameters in logs.
pub fn redact(url: &Url) -> String {
    const SECRET_KEYS: &[&str] = &["api_key", "key", "token", "access_token"];
    if !url.query_pairs().any(|(k, _)| SECRET_KEYS.contains(&k.as_ref())) {
        return url.to_string();
    }
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let value = if SECRET_KEYS.contains(&k.as_ref()) {
                "***".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), value)
        })
        .collect();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

fn truncate(body: &str) -> &str {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
