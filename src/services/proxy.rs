use axum::body::Bytes;
use futures::{Stream, TryStreamExt};
use reqwest::{Client, ClientBuilder, Response};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::BackendConfig;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Backend request timed out after {0}s")]
    Timeout(u64),

    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    #[error("Backend returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

/// Longest upstream error body we keep for logs
const MAX_ERROR_BODY: usize = 512;

/// HTTP client for the Python agent backend
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: Url,
    request_timeout: Duration,
    stream_timeout: Duration,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, ProxyError> {
        let mut base = config.url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| ProxyError::InvalidUrl(format!("{}: {}", config.url, e)))?;

        let client = ClientBuilder::new()
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .user_agent(concat!("climate-assistant-api/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProxyError::InvalidUrl(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            stream_timeout: Duration::from_secs(config.stream_timeout_secs),
        })
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, ProxyError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ProxyError::InvalidUrl(format!("{}: {}", path, e)))
    }

    /// POST a JSON body and decode the JSON reply
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ProxyError> {
        let timeout = self.request_timeout;
        let response = self.send(path, body, timeout).await?;

        response
            .json::<Value>()
            .await
            .map_err(|e| Self::classify(e, timeout))
    }

    /// POST a JSON body and hand back the response body as a byte stream.
    /// The stream timeout covers the whole relay, not just the headers.
    pub async fn post_stream(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<impl Stream<Item = Result<Bytes, ProxyError>> + Send + 'static, ProxyError> {
        let timeout = self.stream_timeout;
        let response = self.send(path, body, timeout).await?;

        Ok(response
            .bytes_stream()
            .map_err(move |e| Self::classify(e, timeout)))
    }

    async fn send(&self, path: &str, body: &Value, timeout: Duration) -> Result<Response, ProxyError> {
        let url = self.endpoint(path)?;
        tracing::debug!("Forwarding request to {}", url);

        let response = self
            .client
            .post(url)
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| Self::classify(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let mut text = response.text().await.unwrap_or_default();
            if text.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !text.is_char_boundary(cut) {
                    cut -= 1;
                }
                text.truncate(cut);
            }
            return Err(ProxyError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(response)
    }

    fn classify(err: reqwest::Error, timeout: Duration) -> ProxyError {
        if err.is_timeout() {
            ProxyError::Timeout(timeout.as_secs())
        } else if err.is_decode() {
            ProxyError::InvalidResponse(err.to_string())
        } else {
            ProxyError::Unreachable(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn client_for(url: &str) -> BackendClient {
        let mut config = AppConfig::development().backend;
        config.url = url.to_string();
        BackendClient::new(&config).unwrap()
    }

    #[test]
    fn joins_paths_under_base_prefix() {
        let client = client_for("http://backend.internal:8000/agents");
        assert_eq!(
            client.endpoint("/api/v1/supervisor-chat").unwrap().as_str(),
            "http://backend.internal:8000/agents/api/v1/supervisor-chat"
        );

        let client = client_for("http://localhost:8000/");
        assert_eq!(
            client.endpoint("api/v1/career-search").unwrap().as_str(),
            "http://localhost:8000/api/v1/career-search"
        );
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let mut config = AppConfig::development().backend;
        config.url = "not a url".to_string();
        assert!(matches!(BackendClient::new(&config), Err(ProxyError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn unreachable_backend_is_reported() {
        // Port 9 (discard) on localhost is closed in test environments
        let client = client_for("http://127.0.0.1:9");
        let err = client.post_json("/api/v1/career-search", &serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ProxyError::Unreachable(_) | ProxyError::Timeout(_)));
    }
}
