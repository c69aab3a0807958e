//! Mock provider for testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use studycoach_core::traits::{
    GenerateRequest, GenerateResponse, LlmProvider, ModelInfo, TokenUsage,
};

/// A mock provider for exercising the coach and the CLI host without real
/// API calls.
///
/// Replies are chosen by prompt substring; queued replies, when present,
/// take precedence and are consumed one per call.
pub struct MockProvider {
    /// Prompt substring → response text, checked in insertion order.
    responses: Vec<(String, String)>,
    /// Replies returned in order before the matching rules apply.
    queue: Mutex<VecDeque<String>>,
    /// Default response if no prompt matches.
    default_response: String,
    call_count: AtomicU32,
    last_request: Mutex<Option<GenerateRequest>>,
}

impl MockProvider {
    /// Create a mock with prompt→response mappings.
    pub fn new(responses: Vec<(String, String)>) -> Self {
        Self {
            responses,
            queue: Mutex::new(VecDeque::new()),
            default_response: String::new(),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same response.
    pub fn with_fixed_response(response: &str) -> Self {
        let mut mock = Self::new(Vec::new());
        mock.default_response = response.to_string();
        mock
    }

    /// Create a mock that returns these replies in order, then the last one
    /// forever.
    pub fn with_sequence<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let queue: VecDeque<String> = replies.into_iter().map(Into::into).collect();
        let mut mock = Self::new(Vec::new());
        mock.default_response = queue.back().cloned().unwrap_or_default();
        mock.queue = Mutex::new(queue);
        mock
    }

    /// Get the number of calls made to this provider.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last request made to this provider.
    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock().unwrap() = Some(request.clone());

        let queued = self.queue.lock().unwrap().pop_front();
        let content = queued.unwrap_or_else(|| {
            self.responses
                .iter()
                .find(|(key, _)| request.prompt.contains(key.as_str()))
                .map(|(_, v)| v.clone())
                .unwrap_or_else(|| self.default_response.clone())
        });

        let prompt_tokens = (request.prompt.len() / 4) as u32;
        let completion_tokens = (content.len() / 4) as u32;

        Ok(GenerateResponse {
            content,
            model: request.model.clone(),
            token_usage: TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
            latency_ms: 1,
        })
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        vec![ModelInfo {
            id: "mock-model".into(),
            name: "Mock Model".into(),
            provider: "mock".into(),
            max_context: 100_000,
        }]
    }
}
