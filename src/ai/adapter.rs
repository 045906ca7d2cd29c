use super::InferenceService;
use crate::models::{Failure, FALLBACK_MESSAGE};
use crate::request::Request;
use crate::Error;

/// Boundary between the controller and the model: exactly one call per
/// request, empty answers become [`FALLBACK_MESSAGE`], and every error is
/// reduced to an opaque [`Failure`] after its cause has been logged.
pub struct InferenceAdapter {
    service: Box<dyn InferenceService>,
}

impl InferenceAdapter {
    pub fn new(service: Box<dyn InferenceService>) -> Self {
        Self { service }
    }

    pub async fn infer(&self, request: &Request) -> std::result::Result<String, Failure> {
        if request.parts.is_empty() {
            tracing::error!("Refusing to send a request with no content parts");
            return Err(Failure::inference());
        }

        match self.service.generate(request).await {
            Ok(Some(text)) if !text.trim().is_empty() => {
                tracing::info!("Received recipe ideas ({} chars)", text.len());
                Ok(text)
            }
            Ok(_) => {
                tracing::warn!("Model returned no usable text, using fallback message");
                Ok(FALLBACK_MESSAGE.to_string())
            }
            Err(Error::Timeout(cause)) => {
                tracing::error!("Recipe inference timed out: {}", cause);
                Err(Failure::timeout())
            }
            Err(e) => {
                tracing::error!("Recipe inference failed: {}", e);
                Err(Failure::inference())
            }
        }
    }
}
