// src/error.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a single call to the translation service.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranslationError {
    #[error("translation input is empty")]
    EmptyInput,

    #[error("translation service unreachable: {0}")]
    Unreachable(String),

    #[error("translation service rate limited the request (HTTP {0})")]
    RateLimited(u16),

    #[error("translation service rejected the request (HTTP {0})")]
    Rejected(u16),

    #[error("malformed translation response: {0}")]
    Malformed(String),
}

impl TranslationError {
    /// Whether another attempt can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::RateLimited(_))
            || matches!(self, Self::Rejected(code) if *code >= 500)
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("input error: {0}")]
    Input(String),

    #[error("translation of comment #{index} failed after {attempts} attempt(s): {source}")]
    Translation {
        index: usize,
        attempts: u32,
        #[source]
        source: TranslationError,
    },

    #[error("no comments left to grade after filtering")]
    DegenerateBatch,

    #[error("run cancelled after {completed}/{total} translations")]
    Cancelled { completed: usize, total: usize },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("resource error: {0}")]
    Resource(String),

    #[error("report error: {0}")]
    Report(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(TranslationError::Unreachable("dns".into()).is_retryable());
        assert!(TranslationError::RateLimited(429).is_retryable());
        assert!(TranslationError::Rejected(503).is_retryable());
        assert!(!TranslationError::Rejected(400).is_retryable());
        assert!(!TranslationError::EmptyInput.is_retryable());
        assert!(!TranslationError::Malformed("x".into()).is_retryable());
    }

    #[test]
    fn translation_error_carries_index() {
        let e = PipelineError::Translation {
            index: 7,
            attempts: 3,
            source: TranslationError::RateLimited(429),
        };
        let msg = e.to_string();
        assert!(msg.contains("#7"));
        assert!(msg.contains("3 attempt"));
    }
}
