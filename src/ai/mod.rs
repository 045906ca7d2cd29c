//! Model integration for recipe suggestions
//!
//! [`InferenceService`] is the raw capability ("accepts a request, returns
//! text"); [`InferenceAdapter`] wraps it with the fallback and failure rules
//! the controller relies on.

pub mod adapter;
pub mod gemini;
pub mod mock;

pub use adapter::InferenceAdapter;
pub use gemini::GeminiRecipeClient;
pub use mock::{MockInferenceClient, MockReply};

use crate::request::Request;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Issue one model call. `Ok(None)` means the model produced no text.
    async fn generate(&self, request: &Request) -> Result<Option<String>>;
}
