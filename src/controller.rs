//! Submission controller
//!
//! Owns the user's current input and the [`SubmissionState`] machine:
//! `Idle -> Loading -> Succeeded | Failed`, with every new submission passing
//! through `Loading` again. At most one model call is in flight per
//! controller; a `submit` issued while loading is rejected, not queued.

use crate::ai::InferenceAdapter;
use crate::image::{EncodedImage, FileSelection, ImageBlob, ImageEncoder};
use crate::models::{Failure, SubmissionState};
use crate::render::{render_markdown, RenderedResult};
use crate::request::{build_parts, Request};
use crate::Result;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{info, warn};

/// An attached image together with its encoding.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub blob: ImageBlob,
    pub encoded: EncodedImage,
}

#[derive(Debug, Default)]
struct UserInput {
    free_text: String,
    image: Option<Attachment>,
}

impl UserInput {
    fn is_eligible(&self) -> bool {
        !self.free_text.trim().is_empty() || self.image.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Blank text and no image.
    EmptyInput,
    /// A submission is already loading.
    InFlight,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Rejected(Rejection),
    Completed(SubmissionState),
}

pub struct SubmissionController {
    adapter: InferenceAdapter,
    encoder: ImageEncoder,
    model: String,
    input: Mutex<UserInput>,
    state: watch::Sender<SubmissionState>,
    file_selection: Option<Box<dyn FileSelection>>,
}

impl SubmissionController {
    pub fn new(adapter: InferenceAdapter, model: impl Into<String>) -> Self {
        Self {
            adapter,
            encoder: ImageEncoder::new(),
            model: model.into(),
            input: Mutex::new(UserInput::default()),
            state: watch::Sender::new(SubmissionState::Idle),
            file_selection: None,
        }
    }

    pub fn with_file_selection(mut self, file_selection: Box<dyn FileSelection>) -> Self {
        self.file_selection = Some(file_selection);
        self
    }

    // Fields are only ever replaced whole, so a poisoned lock is still consistent.
    fn input(&self) -> MutexGuard<'_, UserInput> {
        self.input.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn update_free_text(&self, text: impl Into<String>) {
        self.input().free_text = text.into();
    }

    pub fn free_text(&self) -> String {
        self.input().free_text.clone()
    }

    /// Encode and attach an image, replacing any previous one. On failure the
    /// previous attachment (if any) is kept and the error is returned.
    pub async fn attach_image(&self, blob: ImageBlob) -> Result<()> {
        let encoded = match self.encoder.encode(&blob).await {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(
                    "Could not attach image {}: {}",
                    blob.name().unwrap_or("<unnamed>"),
                    e
                );
                return Err(e);
            }
        };

        info!(
            "Attached {} image ({} bytes)",
            encoded.mime_type,
            blob.len()
        );
        self.input().image = Some(Attachment { blob, encoded });
        Ok(())
    }

    /// Drop the attached image and its preview, and reset the file picker.
    pub fn remove_image(&self) {
        let removed = self.input().image.take();
        if removed.is_some() {
            info!("Removed attached image");
        }
        if let Some(selection) = &self.file_selection {
            selection.reset();
        }
    }

    pub fn has_image(&self) -> bool {
        self.input().image.is_some()
    }

    pub fn attachment(&self) -> Option<Attachment> {
        self.input().image.clone()
    }

    /// `data:` URL of the attached image.
    pub fn preview(&self) -> Option<String> {
        self.input()
            .image
            .as_ref()
            .map(|attachment| attachment.encoded.preview_reference.clone())
    }

    /// Whether a `submit` right now would start a request.
    pub fn can_submit(&self) -> bool {
        let input = self.input();
        input.is_eligible() && !self.state.borrow().is_loading()
    }

    pub fn state(&self) -> SubmissionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.state.subscribe()
    }

    /// Render the current result, if the last submission succeeded.
    pub fn rendered(&self) -> Option<RenderedResult> {
        self.state.borrow().result_text().map(render_markdown)
    }

    /// Build a request from the current input and run it through the model.
    pub async fn submit(&self) -> SubmitOutcome {
        let (request, loading) = {
            let input = self.input();

            if self.state.borrow().is_loading() {
                warn!("Submission ignored: a request is already in flight");
                return SubmitOutcome::Rejected(Rejection::InFlight);
            }

            if !input.is_eligible() {
                warn!("Submission ignored: no ingredients and no image");
                return SubmitOutcome::Rejected(Rejection::EmptyInput);
            }

            // Transition while still holding the input lock so two callers
            // cannot both observe a non-loading state.
            self.state.send_replace(SubmissionState::Loading);
            let loading = LoadingGuard::new(&self.state);

            let image = input.image.as_ref().map(|attachment| &attachment.encoded);
            let request = Request::new(self.model.clone(), build_parts(&input.free_text, image));
            (request, loading)
        };

        info!(
            "Submitting recipe request ({} parts, model {})",
            request.parts.len(),
            request.model
        );

        let next = match self.adapter.infer(&request).await {
            Ok(text) => SubmissionState::Succeeded(text),
            Err(failure) => SubmissionState::Failed(failure),
        };

        info!("Submission finished: {}", next.label());
        loading.finish(next.clone());
        SubmitOutcome::Completed(next)
    }
}

/// Leaves `Loading` when a submission ends. If the `submit` future is dropped
/// mid-flight the state falls back to a generic failure, so the next `submit`
/// is not rejected as in flight.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<SubmissionState>,
    armed: bool,
}

impl<'a> LoadingGuard<'a> {
    fn new(state: &'a watch::Sender<SubmissionState>) -> Self {
        Self { state, armed: true }
    }

    fn finish(mut self, next: SubmissionState) {
        self.armed = false;
        self.state.send_replace(next);
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("Submission abandoned before the model answered");
            self.state.send_replace(SubmissionState::Failed(Failure::inference()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{MockInferenceClient, MockReply};
    use crate::models::{FailureKind, FALLBACK_MESSAGE, GENERIC_FAILURE_MESSAGE};
    use crate::prompts;
    use crate::request::ContentPart;
    use crate::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Notify;

    const MODEL: &str = "gemini-test";

    fn controller(mock: MockInferenceClient) -> SubmissionController {
        SubmissionController::new(InferenceAdapter::new(Box::new(mock)), MODEL)
    }

    fn png_blob(len: usize) -> ImageBlob {
        ImageBlob::new(vec![7u8; len], "image/png")
    }

    #[derive(Default, Clone)]
    struct CountingSelection(Arc<AtomicUsize>);

    impl FileSelection for CountingSelection {
        fn reset(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_starts_idle() {
        let controller = controller(MockInferenceClient::new());

        assert_eq!(controller.state(), SubmissionState::Idle);
        assert!(!controller.can_submit());
        assert!(controller.rendered().is_none());
    }

    #[tokio::test]
    async fn test_empty_submission_is_noop() {
        let mock = MockInferenceClient::new();
        let probe = mock.clone();
        let controller = controller(mock);

        for text in ["", "   ", "\n\t"] {
            controller.update_free_text(text);
            assert_eq!(
                controller.submit().await,
                SubmitOutcome::Rejected(Rejection::EmptyInput)
            );
        }

        assert_eq!(controller.state(), SubmissionState::Idle);
        assert_eq!(probe.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_text_submission_succeeds() {
        let mock = MockInferenceClient::new().with_text_response("## Idea 1\nFrittata".to_string());
        let probe = mock.clone();
        let controller = controller(mock);

        controller.update_free_text("eggs, spinach");
        let outcome = controller.submit().await;

        let expected = SubmissionState::Succeeded("## Idea 1\nFrittata".to_string());
        assert_eq!(outcome, SubmitOutcome::Completed(expected.clone()));
        assert_eq!(controller.state(), expected);

        let requests = probe.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, MODEL);
        assert_eq!(
            requests[0].parts,
            vec![
                ContentPart::Text("the ingredients available are: eggs, spinach".to_string()),
                ContentPart::Text(prompts::recipe_instruction()),
            ]
        );

        let rendered = controller.rendered().unwrap();
        assert_eq!(rendered.headings(), vec!["Idea 1".to_string()]);
    }

    #[tokio::test]
    async fn test_image_only_submission() {
        let mock = MockInferenceClient::new();
        let probe = mock.clone();
        let controller = controller(mock);

        controller.attach_image(png_blob(3)).await.unwrap();
        controller.submit().await;

        let parts = &probe.requests()[0].parts;
        assert_eq!(parts.len(), 2);
        assert_eq!(
            parts[0],
            ContentPart::InlineMedia {
                mime_type: "image/png".to_string(),
                data: "BwcH".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_failure_sets_generic_message() {
        let mock = MockInferenceClient::new().with_failure("connection reset".to_string());
        let controller = controller(mock);

        controller.update_free_text("rice");
        controller.submit().await;

        assert_eq!(
            controller.state(),
            SubmissionState::Failed(Failure {
                kind: FailureKind::Inference,
                message: GENERIC_FAILURE_MESSAGE.to_string(),
            })
        );
        assert!(controller.rendered().is_none());
    }

    #[tokio::test]
    async fn test_empty_response_succeeds_with_fallback() {
        let controller = controller(MockInferenceClient::new().with_reply(MockReply::Empty));

        controller.update_free_text("rice");
        controller.submit().await;

        assert_eq!(
            controller.state(),
            SubmissionState::Succeeded(FALLBACK_MESSAGE.to_string())
        );
    }

    #[tokio::test]
    async fn test_resubmit_after_failure_recovers() {
        let mock = MockInferenceClient::new()
            .with_reply(MockReply::Timeout)
            .with_text_response("## Idea 1".to_string());
        let controller = controller(mock);
        controller.update_free_text("beans");

        controller.submit().await;
        assert!(matches!(
            controller.state(),
            SubmissionState::Failed(Failure {
                kind: FailureKind::Timeout,
                ..
            })
        ));

        controller.submit().await;
        assert_eq!(
            controller.state(),
            SubmissionState::Succeeded("## Idea 1".to_string())
        );
    }

    #[tokio::test]
    async fn test_second_submit_while_loading_is_rejected() {
        let gate = Arc::new(Notify::new());
        let mock = MockInferenceClient::new().with_gate(Arc::clone(&gate));
        let probe = mock.clone();
        let controller = Arc::new(controller(mock));
        controller.update_free_text("lentils");

        let mut states = controller.subscribe();
        let first = tokio::spawn({
            let controller = Arc::clone(&controller);
            async move { controller.submit().await }
        });

        states.wait_for(|state| state.is_loading()).await.unwrap();
        assert!(!controller.can_submit());

        controller.update_free_text("something else");
        assert_eq!(
            controller.submit().await,
            SubmitOutcome::Rejected(Rejection::InFlight)
        );
        assert_eq!(controller.state(), SubmissionState::Loading);

        gate.notify_one();
        let outcome = first.await.unwrap();

        assert!(matches!(
            outcome,
            SubmitOutcome::Completed(SubmissionState::Succeeded(_))
        ));
        assert_eq!(probe.get_call_count(), 1);
        assert!(matches!(
            &probe.requests()[0].parts[0],
            ContentPart::Text(text) if text.ends_with("lentils")
        ));
    }

    #[tokio::test]
    async fn test_abandoned_submit_does_not_block_the_next_one() {
        let gate = Arc::new(Notify::new());
        let mock = MockInferenceClient::new()
            .with_text_response("## Idea 1".to_string())
            .with_gate(Arc::clone(&gate));
        let probe = mock.clone();
        let controller = controller(mock);
        controller.update_free_text("leeks");

        let abandoned =
            tokio::time::timeout(std::time::Duration::from_millis(50), controller.submit()).await;
        assert!(abandoned.is_err());
        assert_eq!(
            controller.state(),
            SubmissionState::Failed(Failure::inference())
        );
        assert!(controller.can_submit());

        gate.notify_one();
        let outcome = controller.submit().await;

        assert_eq!(
            outcome,
            SubmitOutcome::Completed(SubmissionState::Succeeded("## Idea 1".to_string()))
        );
        assert_eq!(probe.get_call_count(), 2);
    }

    #[tokio::test]
    async fn test_update_free_text_replaces_text() {
        let controller = controller(MockInferenceClient::new());
        assert_eq!(controller.free_text(), "");

        controller.update_free_text("eggs");
        controller.update_free_text("eggs, feta");

        assert_eq!(controller.free_text(), "eggs, feta");
        assert!(controller.can_submit());
    }

    #[tokio::test]
    async fn test_new_submit_clears_previous_result() {
        let gate = Arc::new(Notify::new());
        let mock = MockInferenceClient::new()
            .with_text_response("## Old".to_string())
            .with_gate(Arc::clone(&gate));
        let controller = Arc::new(controller(mock));
        controller.update_free_text("oats");

        gate.notify_one();
        controller.submit().await;
        assert!(controller.rendered().is_some());

        let mut states = controller.subscribe();
        let pending = tokio::spawn({
            let controller = Arc::clone(&controller);
            async move { controller.submit().await }
        });

        states.wait_for(|state| state.is_loading()).await.unwrap();
        assert!(controller.rendered().is_none());

        gate.notify_one();
        pending.await.unwrap();
    }

    #[tokio::test]
    async fn test_attach_preview_and_remove() {
        let controller = controller(MockInferenceClient::new());

        controller.attach_image(png_blob(3)).await.unwrap();
        assert!(controller.has_image());
        assert!(controller.can_submit());
        assert_eq!(
            controller.preview().as_deref(),
            Some("data:image/png;base64,BwcH")
        );

        controller.remove_image();
        assert!(!controller.has_image());
        assert_eq!(controller.preview(), None);

        controller.remove_image();
        assert!(!controller.has_image());
        assert_eq!(controller.preview(), None);
        assert!(controller.attachment().is_none());
    }

    #[tokio::test]
    async fn test_remove_image_resets_file_selection() {
        let selection = CountingSelection::default();
        let resets = Arc::clone(&selection.0);
        let controller =
            controller(MockInferenceClient::new()).with_file_selection(Box::new(selection));

        controller.attach_image(png_blob(1)).await.unwrap();
        controller.remove_image();

        assert_eq!(resets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_attach_keeps_previous_image() {
        let controller = controller(MockInferenceClient::new());
        controller.attach_image(png_blob(2)).await.unwrap();
        let before = controller.preview();

        let err = controller
            .attach_image(ImageBlob::new(vec![1u8], "text/plain"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Encoding(_)));
        assert_eq!(controller.preview(), before);
    }

    #[tokio::test]
    async fn test_failed_attach_without_image_keeps_submission_blocked() {
        let controller = controller(MockInferenceClient::new());

        assert!(controller
            .attach_image(ImageBlob::new(Vec::<u8>::new(), "image/png"))
            .await
            .is_err());

        assert!(!controller.has_image());
        assert_eq!(
            controller.submit().await,
            SubmitOutcome::Rejected(Rejection::EmptyInput)
        );
    }

    #[tokio::test]
    async fn test_attach_replaces_previous_image() {
        let controller = controller(MockInferenceClient::new());

        controller.attach_image(png_blob(1)).await.unwrap();
        controller
            .attach_image(ImageBlob::new(vec![0xFFu8, 0xD8, 0xFF], "image/jpeg"))
            .await
            .unwrap();

        assert_eq!(
            controller.attachment().unwrap().encoded.mime_type,
            "image/jpeg"
        );
    }
}
