//! Error types for the quiz core and for LLM provider calls.
//!
//! `ProviderError` lives here rather than in `studycoach-providers` so the
//! host can downcast an `anyhow::Error` and decide whether a failed
//! generation is worth retrying without string matching.

use thiserror::Error;

/// Failures reported by the quiz compiler and the quiz session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    /// The generator text could not be read as a JSON array of questions.
    #[error("malformed quiz payload: {0}")]
    MalformedPayload(String),

    /// No valid question survived compilation.
    #[error("no valid questions in quiz payload")]
    EmptyResult,

    /// A session was constructed with unusable arguments.
    #[error("invalid quiz configuration: {0}")]
    InvalidConfiguration(String),

    /// The session has no question on screen (finished or not started).
    #[error("no active question")]
    NoActiveQuestion,

    /// A result was requested before the last question was advanced past.
    #[error("quiz session is not complete")]
    SessionNotComplete,
}

impl QuizError {
    /// Returns `true` if regenerating the quiz may fix this error.
    pub fn is_generation_failure(&self) -> bool {
        matches!(self, QuizError::MalformedPayload(_) | QuizError::EmptyResult)
    }
}

/// Errors that can occur when interacting with an LLM provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthenticationFailed(_) | ProviderError::ModelNotFound(_)
        )
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ProviderError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_failures_are_retryable_by_host() {
        assert!(QuizError::EmptyResult.is_generation_failure());
        assert!(QuizError::MalformedPayload("x".into()).is_generation_failure());
        assert!(!QuizError::SessionNotComplete.is_generation_failure());
    }

    #[test]
    fn permanent_provider_errors() {
        assert!(ProviderError::AuthenticationFailed("bad key".into()).is_permanent());
        assert!(ProviderError::ModelNotFound("m".into()).is_permanent());
        assert!(!ProviderError::Timeout(120).is_permanent());
        assert_eq!(
            ProviderError::RateLimited {
                retry_after_ms: 5000
            }
            .retry_after_ms(),
            Some(5000)
        );
    }
}
