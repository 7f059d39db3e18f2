//! Shared HTTP plumbing for the Ollama embedding and generation endpoints.

use crate::config::OllamaSettings;
use crate::error::{Result, VidragError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Default Ollama API URL.
pub const OLLAMA_DEFAULT_URL: &str = "http://localhost:11434";

/// Thin JSON-over-HTTP client for an Ollama server.
#[derive(Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: Url,
}

impl OllamaClient {
    /// Creates a client for the default localhost URL.
    pub fn new() -> Result<Self> {
        Self::with_config(&OllamaSettings::default())
    }

    /// Creates a client from settings.
    pub fn with_config(settings: &OllamaSettings) -> Result<Self> {
        let base_url = Url::parse(&settings.base_url).map_err(|e| {
            VidragError::Config(format!("Invalid Ollama URL '{}': {}", settings.base_url, e))
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an API path such as `api/embed` against the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join(path.trim_start_matches('/'))
            .map_err(|e| VidragError::Config(format!("Invalid Ollama endpoint '{}': {}", path, e)))
    }

    /// POST a JSON body and decode a JSON response.
    ///
    /// Transport failures, non-2xx statuses and undecodable bodies are all
    /// reported through `service_error`, so each caller attributes them to
    /// its own service.
    pub async fn post_json<Req, Resp>(
        &self,
        path: &str,
        body: &Req,
        service_error: fn(String) -> VidragError,
    ) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        debug!("POST {}", url);

        let response = self
            .http
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| service_error(format!("{} request failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(service_error(format!("{} returned {}: {}", url, status, text.trim())));
        }

        response
            .json::<Resp>()
            .await
            .map_err(|e| service_error(format!("Invalid response from {}: {}", url, e)))
    }

    /// Check that the server answers at all.
    pub async fn ping(&self) -> Result<bool> {
        let url = self.endpoint("api/tags")?;
        Ok(self
            .http
            .get(url)
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_with_and_without_trailing_slash() {
        let client = OllamaClient::new().unwrap();
        assert_eq!(
            client.endpoint("api/embed").unwrap().as_str(),
            "http://localhost:11434/api/embed"
        );

        let settings = OllamaSettings {
            base_url: "http://gpu-box:11434/ollama".to_string(),
            timeout_seconds: 10,
        };
        let client = OllamaClient::with_config(&settings).unwrap();
        assert_eq!(
            client.endpoint("/api/generate").unwrap().as_str(),
            "http://gpu-box:11434/ollama/api/generate"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let settings = OllamaSettings {
            base_url: "not a url".to_string(),
            timeout_seconds: 10,
        };
        assert!(matches!(
            OllamaClient::with_config(&settings),
            Err(VidragError::Config(_))
        ));
    }
}
