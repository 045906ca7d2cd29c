use crate::config::DEFAULT_BASE_URL;
use crate::{Error, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Lightweight Gemini REST client.
pub struct GeminiHttpClient {
    pub(crate) client: Client,
    pub(crate) api_key: String,
    pub(crate) base_url: String,
    timeout: Duration,
}

impl GeminiHttpClient {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self::new_with_client(api_key, timeout, Client::new())
    }

    pub fn new_with_client(api_key: String, timeout: Duration, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Strips an optional `models/` prefix from a model ID.
    pub fn bare_model(model: &str) -> &str {
        model.strip_prefix("models/").unwrap_or(model)
    }

    fn transport_error(e: reqwest::Error) -> Error {
        if e.is_timeout() {
            tracing::error!("Gemini request timed out: {}", e);
            Error::Timeout(e.to_string())
        } else {
            tracing::error!("Failed to send request to Gemini: {}", e);
            Error::Http(e)
        }
    }

    async fn post_to_url<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        url: String,
        request: &Req,
    ) -> Result<Resp> {
        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(Self::transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.map_err(Self::transport_error)?;
            tracing::error!("Gemini API error (status {}): {}", status, error_text);
            return Err(Error::AiProvider(format!(
                "Gemini API error (status {}): {}",
                status, error_text
            )));
        }

        let body = response.text().await.map_err(Self::transport_error)?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}\nBody: {}", e, body);
            Error::AiProvider(format!("Failed to parse Gemini response: {}", e))
        })
    }

    /// Calls Gemini's `generateContent` endpoint for `model`.
    pub async fn generate_content<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        model: &str,
        request: &Req,
    ) -> Result<Resp> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url,
            Self::bare_model(model)
        );
        tracing::debug!("Sending generateContent request to {}", url);
        self.post_to_url(url, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_model_strips_prefix() {
        assert_eq!(
            GeminiHttpClient::bare_model("models/gemini-2.5-flash"),
            "gemini-2.5-flash"
        );
        assert_eq!(
            GeminiHttpClient::bare_model("gemini-2.5-flash"),
            "gemini-2.5-flash"
        );
    }

    #[test]
    fn test_with_base_url_trims_trailing_slash() {
        let client = GeminiHttpClient::new("key".to_string(), Duration::from_secs(1))
            .with_base_url("http://127.0.0.1:9000/".to_string());
        assert_eq!(client.base_url, "http://127.0.0.1:9000");
    }
}
