use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentRequest, GenerateContentResponse, Part};
use crate::ai::InferenceService;
use crate::request::Request;
use crate::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Gemini implementation of [`InferenceService`].
pub struct GeminiRecipeClient {
    http: GeminiHttpClient,
}

impl GeminiRecipeClient {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self::new_with_client(api_key, timeout, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, timeout: Duration, client: reqwest::Client) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(api_key, timeout, client),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    fn to_wire(request: &Request) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: request.parts.iter().map(Part::from).collect(),
            }],
        }
    }
}

#[async_trait]
impl InferenceService for GeminiRecipeClient {
    async fn generate(&self, request: &Request) -> Result<Option<String>> {
        tracing::debug!(
            "Requesting recipe ideas from {} ({} parts)",
            request.model,
            request.parts.len()
        );

        let response: GenerateContentResponse = self
            .http
            .generate_content(&request.model, &Self::to_wire(request))
            .await?;

        Ok(response.text())
    }
}
