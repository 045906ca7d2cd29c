use super::InferenceService;
use crate::request::Request;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const DEFAULT_MOCK_RESPONSE: &str = "## Idea 1: Vegetable Omelette\n\
A quick breakfast.\n\n\
1. Whisk the eggs.\n\
2. Cook with the vegetables.\n";

/// Scripted outcome of one mock call.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Empty,
    Failure(String),
    Timeout,
}

/// In-memory [`InferenceService`]. Clones share state, so a clone can be kept
/// as a probe after the original is moved into an adapter.
#[derive(Clone, Default)]
pub struct MockInferenceClient {
    replies: Arc<Mutex<Vec<MockReply>>>,
    requests: Arc<Mutex<Vec<Request>>>,
    call_count: Arc<Mutex<usize>>,
    gate: Option<Arc<Notify>>,
}

impl MockInferenceClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, reply: MockReply) -> Self {
        self.replies.lock().unwrap().push(reply);
        self
    }

    pub fn with_text_response(self, response: String) -> Self {
        self.with_reply(MockReply::Text(response))
    }

    pub fn with_failure(self, message: String) -> Self {
        self.with_reply(MockReply::Failure(message))
    }

    /// Hold every call until the gate is notified.
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceService for MockInferenceClient {
    async fn generate(&self, request: &Request) -> Result<Option<String>> {
        let reply = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            self.requests.lock().unwrap().push(request.clone());

            let replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                MockReply::Text(DEFAULT_MOCK_RESPONSE.to_string())
            } else {
                replies[(*count - 1) % replies.len()].clone()
            }
        };

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        match reply {
            MockReply::Text(text) => Ok(Some(text)),
            MockReply::Empty => Ok(None),
            MockReply::Failure(message) => Err(Error::AiProvider(message)),
            MockReply::Timeout => Err(Error::Timeout("mock timeout".to_string())),
        }
    }
}
