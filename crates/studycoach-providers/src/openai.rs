//! OpenAI-compatible chat-completion provider.
//!
//! Groq serves the same `/v1/chat/completions` API under its own base URL,
//! so one implementation covers both; the presets differ only in name,
//! base URL, and model list.

use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use studycoach_core::traits::{
    GenerateRequest, GenerateResponse, LlmProvider, ModelInfo, TokenUsage,
};

use crate::error::ProviderError;

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Which hosted API a provider talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Groq,
    OpenAi,
}

impl Flavor {
    fn name(self) -> &'static str {
        match self {
            Flavor::Groq => "groq",
            Flavor::OpenAi => "openai",
        }
    }

    fn default_base_url(self) -> &'static str {
        match self {
            Flavor::Groq => GROQ_BASE_URL,
            Flavor::OpenAi => OPENAI_BASE_URL,
        }
    }
}

/// Provider for OpenAI-style chat-completion endpoints.
pub struct OpenAiCompatProvider {
    flavor: Flavor,
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    pub fn new(flavor: Flavor, api_key: &str, base_url: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            flavor,
            api_key: api_key.to_string(),
            base_url: base_url
                .unwrap_or_else(|| flavor.default_base_url().to_string())
                .trim_end_matches('/')
                .to_string(),
            client,
        })
    }

    pub fn groq(api_key: &str, base_url: Option<String>) -> anyhow::Result<Self> {
        Self::new(Flavor::Groq, api_key, base_url)
    }

    pub fn openai(api_key: &str, base_url: Option<String>) -> anyhow::Result<Self> {
        Self::new(Flavor::OpenAi, api_key, base_url)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: ChatUsage,
    model: String,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Default)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        self.flavor.name()
    }

    #[instrument(skip(self, request), fields(provider = self.flavor.name(), model = %request.model))]
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        let start = Instant::now();

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        let body = ChatRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(DEFAULT_TIMEOUT_SECS)
                } else {
                    ProviderError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
                * 1000;
            return Err(ProviderError::RateLimited {
                retry_after_ms: retry_after,
            }
            .into());
        }
        if status == 401 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::AuthenticationFailed(body).into());
        }
        if status == 404 {
            return Err(ProviderError::ModelNotFound(request.model.clone()).into());
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status,
                message: body,
            }
            .into());
        }

        let api_response: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::ApiError {
                    status: 0,
                    message: format!("failed to parse response: {e}"),
                })?;

        let latency_ms = start.elapsed().as_millis() as u64;
        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        tracing::debug!(latency_ms, chars = content.len(), "completion received");

        Ok(GenerateResponse {
            content,
            model: api_response.model,
            token_usage: TokenUsage {
                prompt_tokens: api_response.usage.prompt_tokens,
                completion_tokens: api_response.usage.completion_tokens,
                total_tokens: api_response.usage.total_tokens,
            },
            latency_ms,
        })
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        let provider = self.flavor.name();
        let models: &[(&str, &str, u32)] = match self.flavor {
            Flavor::Groq => &[
                ("llama-3.1-8b-instant", "Llama 3.1 8B Instant", 131_072),
                ("llama-3.3-70b-versatile", "Llama 3.3 70B Versatile", 131_072),
            ],
            Flavor::OpenAi => &[
                ("gpt-4.1-mini", "GPT-4.1 Mini", 1_000_000),
                ("gpt-4.1", "GPT-4.1", 1_000_000),
            ],
        };
        models
            .iter()
            .map(|(id, name, max_context)| ModelInfo {
                id: (*id).into(),
                name: (*name).into(),
                provider: provider.into(),
                max_context: *max_context,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(model: &str) -> GenerateRequest {
        GenerateRequest {
            model: model.into(),
            prompt: "Generate exactly 1 multiple choice questions about Rust.".into(),
            system_prompt: Some("You are a quiz generator.".into()),
            max_tokens: 2000,
            temperature: 0.7,
        }
    }

    #[tokio::test]
    async fn successful_generation() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({
            "choices": [{"message": {"content": "[{\"question\":\"Q\"}]", "role": "assistant"}, "index": 0}],
            "model": "llama-3.1-8b-instant",
            "usage": {"prompt_tokens": 40, "completion_tokens": 15, "total_tokens": 55}
        });

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama-3.1-8b-instant",
                "messages": [
                    {"role": "system", "content": "You are a quiz generator."},
                    {"role": "user", "content": "Generate exactly 1 multiple choice questions about Rust."}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .mount(&server)
            .await;

        let provider = OpenAiCompatProvider::groq("test-key", Some(server.uri())).unwrap();
        let response = provider
            .generate(&request("llama-3.1-8b-instant"))
            .await
            .unwrap();
        assert!(response.content.contains("question"));
        assert_eq!(response.token_usage.total_tokens, 55);
        assert_eq!(provider.name(), "groq");
    }

    #[tokio::test]
    async fn null_content_becomes_empty() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({
            "choices": [{"message": {"content": null, "role": "assistant"}, "index": 0}],
            "model": "gpt-4.1-mini"
        });

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .mount(&server)
            .await;

        let provider = OpenAiCompatProvider::openai("key", Some(format!("{}/", server.uri()))).unwrap();
        let response = provider.generate(&request("gpt-4.1-mini")).await.unwrap();
        assert_eq!(response.content, "");
        assert_eq!(response.token_usage, TokenUsage::default());
    }

    #[tokio::test]
    async fn rate_limit_is_classified() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "2"))
            .mount(&server)
            .await;

        let provider = OpenAiCompatProvider::groq("key", Some(server.uri())).unwrap();
        let err = provider
            .generate(&request("llama-3.1-8b-instant"))
            .await
            .unwrap_err();
        let provider_err = err.downcast_ref::<ProviderError>().unwrap();
        assert_eq!(provider_err.retry_after_ms(), Some(2000));
        assert!(!provider_err.is_permanent());
    }

    #[tokio::test]
    async fn unauthorized_is_permanent() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let provider = OpenAiCompatProvider::groq("bad", Some(server.uri())).unwrap();
        let err = provider
            .generate(&request("llama-3.1-8b-instant"))
            .await
            .unwrap_err();
        let provider_err = err.downcast_ref::<ProviderError>().unwrap();
        assert!(matches!(provider_err, ProviderError::AuthenticationFailed(_)));
        assert!(provider_err.is_permanent());
    }

    #[tokio::test]
    async fn error_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let provider = OpenAiCompatProvider::groq("key", Some(server.uri())).unwrap();
        let err = provider
            .generate(&request("llama-3.1-8b-instant"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn model_lists_per_flavor() {
        let groq = OpenAiCompatProvider::groq("k", None).unwrap();
        assert_eq!(groq.base_url, GROQ_BASE_URL);
        assert!(groq
            .available_models()
            .iter()
            .any(|m| m.id == "llama-3.1-8b-instant"));

        let openai = OpenAiCompatProvider::openai("k", None).unwrap();
        assert!(openai.available_models().iter().all(|m| m.provider == "openai"));
    }
}
