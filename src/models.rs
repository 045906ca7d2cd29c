//! Submission state shared between the controller and its observers.

pub const GENERIC_FAILURE_MESSAGE: &str =
    "Something went wrong while generating recipe ideas. Please try again.";
pub const TIMEOUT_FAILURE_MESSAGE: &str =
    "The recipe request took too long to answer. Please try again.";
pub const FALLBACK_MESSAGE: &str = "No recipe ideas were generated. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Inference,
    Timeout,
}

/// Opaque, user-facing failure. The underlying cause is only logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn inference() -> Self {
        Self {
            kind: FailureKind::Inference,
            message: GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    pub fn timeout() -> Self {
        Self {
            kind: FailureKind::Timeout,
            message: TIMEOUT_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Loading,
    Succeeded(String),
    Failed(Failure),
}

impl SubmissionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SubmissionState::Loading)
    }

    pub fn result_text(&self) -> Option<&str> {
        match self {
            SubmissionState::Succeeded(text) => Some(text),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SubmissionState::Idle => "idle",
            SubmissionState::Loading => "loading",
            SubmissionState::Succeeded(_) => "succeeded",
            SubmissionState::Failed(_) => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_idle() {
        assert_eq!(SubmissionState::default(), SubmissionState::Idle);
    }

    #[test]
    fn test_result_text_only_for_success() {
        assert_eq!(
            SubmissionState::Succeeded("## Idea".to_string()).result_text(),
            Some("## Idea")
        );
        assert_eq!(SubmissionState::Loading.result_text(), None);
        assert_eq!(
            SubmissionState::Failed(Failure::inference()).result_text(),
            None
        );
    }

    #[test]
    fn test_failure_kinds_have_distinct_messages() {
        assert_ne!(Failure::inference().message, Failure::timeout().message);
        assert_eq!(Failure::timeout().kind, FailureKind::Timeout);
        assert_eq!(Failure::inference().to_string(), GENERIC_FAILURE_MESSAGE);
    }
}
