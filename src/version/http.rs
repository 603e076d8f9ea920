//! Thin wrapper around the HTTP client shared by all fetchers

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ResolverConfig;
use crate::version::error::FetchError;

/// HTTP client used by fetchers to talk to registries and forges
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(config: &ResolverConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_millis(config.http_timeout_ms))
            .build()?;
        Ok(Self { client })
    }

    /// GET `url` and return the body, or `None` when the server answers 404
    pub async fn get_text_optional(&self, url: &str) -> Result<Option<String>, FetchError> {
        debug!("fetch {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            debug!("{} returned 404", url);
            return Ok(None);
        }

        if !status.is_success() {
            warn!("{} returned status {}", url, status);
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        Ok(Some(response.text().await?))
    }

    /// Like [`Self::get_text_optional`], decoding the body as JSON
    pub async fn get_json_optional<T: DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<Option<T>, FetchError> {
        let Some(body) = self.get_text_optional(url).await? else {
            return Ok(None);
        };
        serde_json::from_str(&body).map(Some).map_err(|e| {
            warn!("Failed to parse response from {}: {}", url, e);
            FetchError::InvalidResponse(format!("{url}: {e}"))
        })
    }

    /// GET `url` without interpreting the status, for callers that branch on it
    pub async fn get_status(&self, url: &str) -> Result<(StatusCode, String), FetchError> {
        debug!("fetch {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }
}
