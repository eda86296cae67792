use crate::transcript::TranscriptEntry;
use async_trait::async_trait;
use std::time::Duration;

/// The inference call the agent loop drives: transcript in, raw text out.
///
/// This trait lives in tool-runtime (not in crates/llm) because it's
/// defined by the consumer (the agent loop), not the provider.
/// Implementations live in crates/llm or adapter crates.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Send the full transcript and return the model's raw response text.
    async fn complete(&self, transcript: &[TranscriptEntry]) -> Result<String, InferenceError>;

    /// Provider name for logging/debugging (e.g., "anthropic", "openai", "ollama")
    fn provider_name(&self) -> &str;
}

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Inference timed out after {0:?}")]
    Timeout(Duration),
    #[error("{0}")]
    Other(String),
}

/// Mock inference provider for testing the agent loop without real API calls.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    enum Scripted {
        Response(String),
        Error(String),
        Stall,
    }

    /// Returns pre-configured responses in the order they were queued and
    /// records the transcript of every call.
    pub struct MockInference {
        script: Mutex<VecDeque<Scripted>>,
        calls: Mutex<Vec<Vec<TranscriptEntry>>>,
    }

    impl MockInference {
        pub fn new() -> Self {
            Self {
                script: Mutex::new(VecDeque::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Queue a raw response for the next call.
        pub fn queue_response(&self, text: impl Into<String>) -> &Self {
            self.push(Scripted::Response(text.into()))
        }

        /// Queue a failing call.
        pub fn queue_error(&self, message: impl Into<String>) -> &Self {
            self.push(Scripted::Error(message.into()))
        }

        /// Queue a call that never completes.
        pub fn queue_stall(&self) -> &Self {
            self.push(Scripted::Stall)
        }

        fn push(&self, item: Scripted) -> &Self {
            self.script.lock().unwrap().push_back(item);
            self
        }

        /// Transcripts seen so far, one per call.
        pub fn calls(&self) -> Vec<Vec<TranscriptEntry>> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn remaining(&self) -> usize {
            self.script.lock().unwrap().len()
        }
    }

    impl Default for MockInference {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl InferenceProvider for MockInference {
        async fn complete(
            &self,
            transcript: &[TranscriptEntry],
        ) -> Result<String, InferenceError> {
            self.calls.lock().unwrap().push(transcript.to_vec());
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(Scripted::Response(text)) => Ok(text),
                Some(Scripted::Error(message)) => Err(InferenceError::Other(message)),
                Some(Scripted::Stall) => std::future::pending().await,
                None => Err(InferenceError::Other("mock script exhausted".to_string())),
            }
        }

        fn provider_name(&self) -> &str {
            "mock"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockInference;
    use super::*;
    use crate::transcript::Transcript;

    #[tokio::test]
    async fn test_mock_replays_in_order_and_records_calls() {
        let mock = MockInference::new();
        mock.queue_response("first").queue_error("boom");

        let transcript = Transcript::new("sys");
        assert_eq!(mock.complete(transcript.snapshot()).await.unwrap(), "first");
        let err = mock.complete(transcript.snapshot()).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert!(mock.complete(transcript.snapshot()).await.is_err());

        assert_eq!(mock.call_count(), 3);
        assert_eq!(mock.calls()[0].len(), 1);
        assert_eq!(mock.remaining(), 0);
    }
}
