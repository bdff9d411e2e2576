use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use super::http::{send_with_retry, RetryPolicy};
use super::types::ProviderError;
use crate::credentials::Credentials;

/// Default request timeout in seconds
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Streaming completions can run for many minutes
pub(crate) const STREAM_TIMEOUT_SECS: u64 = 900;

/// Default CLI version (from Cargo.toml)
const DEFAULT_VERSION: &str = env!("CARGO_PKG_VERSION");

fn build_user_agent() -> String {
    std::env::var("ARCODE_USER_AGENT").unwrap_or_else(|_| format!("arcode/{}", DEFAULT_VERSION))
}

/// HTTP client for one provider.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    credentials: Credentials,
    user_agent: String,
    session_id: String,
    retry: RetryPolicy,
}

impl ApiClient {
    pub fn new(credentials: Credentials) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            credentials,
            user_agent: build_user_agent(),
            session_id: Uuid::new_v4().to_string(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Join `endpoint` onto `base_url`, keeping any path the base already has.
    pub(crate) fn build_url(base_url: &str, endpoint: &str) -> Result<Url, ProviderError> {
        let base = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base = Url::parse(&base)
            .map_err(|e| ProviderError::Transport(format!("Invalid base URL {}: {}", base_url, e)))?;
        base.join(endpoint.trim_start_matches('/')).map_err(|e| {
            ProviderError::Transport(format!("Failed to build URL for {}: {}", endpoint, e))
        })
    }

    fn client_with_timeout(&self, timeout_secs: u64) -> Result<Client, ProviderError> {
        if timeout_secs == DEFAULT_TIMEOUT_SECS {
            return Ok(self.client.clone());
        }

        Ok(Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?)
    }

    /// POST a JSON body with retries; non-success statuses become errors.
    pub(crate) async fn post_json<T>(
        &self,
        endpoint: &str,
        body: &T,
        timeout_secs: u64,
    ) -> Result<reqwest::Response, ProviderError>
    where
        T: Serialize,
    {
        let url = Self::build_url(&self.credentials.api_base, endpoint)?;
        let request_id = Uuid::new_v4().to_string();

        debug!("=== API Request ===");
        debug!("URL: {}", url);
        debug!("Timeout: {}s", timeout_secs);

        let client = self.client_with_timeout(timeout_secs)?;
        let headers = self.credentials.auth_headers();

        let response = send_with_retry(self.retry, || {
            let mut request = client
                .post(url.clone())
                .header("Content-Type", "application/json")
                .header("User-Agent", &self.user_agent)
                .header("x-request-id", &request_id)
                .header("x-request-session-id", &self.session_id);

            for (name, value) in &headers {
                request = request.header(*name, value);
            }

            request.json(body)
        })
        .await?;

        debug!("=== API Response ===");
        debug!("Status: {}", response.status());
        Ok(response)
    }

    /// POST and decode a JSON response.
    pub(crate) async fn call_json<T, R>(&self, endpoint: &str, body: &T) -> Result<R, ProviderError>
    where
        T: Serialize,
        R: for<'de> Deserialize<'de>,
    {
        let response = self.post_json(endpoint, body, DEFAULT_TIMEOUT_SECS).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ProviderError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_keeps_base_path() {
        let url = ApiClient::build_url("https://api.openai.com/v1", "chat/completions").unwrap();
        assert_eq!(url.as_str(), "https://api.openai.com/v1/chat/completions");

        let url = ApiClient::build_url("https://api.openai.com/v1/", "/embeddings").unwrap();
        assert_eq!(url.as_str(), "https://api.openai.com/v1/embeddings");
    }

    #[test]
    fn test_build_url_with_query() {
        let url = ApiClient::build_url(
            "https://example.openai.azure.com",
            "openai/deployments/gpt-4o/chat/completions?api-version=2024-02-01",
        )
        .unwrap();
        assert_eq!(url.path(), "/openai/deployments/gpt-4o/chat/completions");
        assert_eq!(url.query(), Some("api-version=2024-02-01"));
    }

    #[test]
    fn test_build_url_rejects_garbage() {
        assert!(ApiClient::build_url("not a url", "x").is_err());
    }

    #[test]
    fn test_user_agent_default() {
        if std::env::var("ARCODE_USER_AGENT").is_err() {
            assert!(build_user_agent().starts_with("arcode/"));
        }
    }
}
