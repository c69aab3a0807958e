//! studycoach-providers: chat-completion provider integrations.
//!
//! Implements the `LlmProvider` trait for OpenAI-compatible APIs (Groq by
//! default) plus a mock for tests, and loads provider configuration.

pub mod config;
pub mod error;
pub mod mock;
pub mod openai;

pub use config::{create_provider, load_config, ProviderConfig, StudycoachConfig};
pub use error::ProviderError;
