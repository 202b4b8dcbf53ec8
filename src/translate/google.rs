// src/translate/google.rs
//! Google Translate provider (public `translate_a/single` endpoint, `client=gtx`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use super::Translator;
use crate::config::TranslateConfig;
use crate::error::{PipelineError, Result, TranslationError};

pub struct GoogleTranslator {
    http: reqwest::Client,
    endpoint: String,
    source: String,
    target: String,
}

impl GoogleTranslator {
    pub fn new(cfg: &TranslateConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("course-sentiment/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .map_err(|e| PipelineError::Config(format!("building HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: cfg.endpoint.clone(),
            source: cfg.source_lang.clone(),
            target: cfg.target_lang.clone(),
        })
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str) -> std::result::Result<String, TranslationError> {
        if text.trim().is_empty() {
            return Err(TranslationError::EmptyInput);
        }

        let resp = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", self.source.as_str()),
                ("tl", self.target.as_str()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .map_err(|e| TranslationError::Unreachable(e.to_string()))?;

        map_status(resp.status())?;

        let body: Value = resp
            .json()
            .await
            .map_err(|e| TranslationError::Malformed(e.to_string()))?;
        parse_gtx_response(&body)
    }

    fn name(&self) -> &'static str {
        "google"
    }
}

/// 429 is worth retrying; any other non-2xx is final.
pub fn map_status(status: StatusCode) -> std::result::Result<(), TranslationError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(TranslationError::RateLimited(status.as_u16()));
    }
    if !status.is_success() {
        return Err(TranslationError::Rejected(status.as_u16()));
    }
    Ok(())
}

/// The body is a nested array; `body[0]` lists `[translated, source, ...]`
/// segments, one per sentence.
pub fn parse_gtx_response(body: &Value) -> std::result::Result<String, TranslationError> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslationError::Malformed("missing segment list".to_string()))?;

    let text: String = segments
        .iter()
        .filter_map(|seg| seg.get(0).and_then(Value::as_str))
        .collect();

    if text.trim().is_empty() {
        return Err(TranslationError::Malformed("no translated text".to_string()));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn joins_sentence_segments() {
        let body = json!([
            [
                ["The course was very good. ", "El curso fue muy bueno. ", null, null, 10],
                ["I learned a lot", "Aprendí mucho", null, null, 10]
            ],
            null,
            "es"
        ]);
        assert_eq!(
            parse_gtx_response(&body).unwrap(),
            "The course was very good. I learned a lot"
        );
    }

    #[test]
    fn status_codes_map_to_error_kinds() {
        assert_eq!(map_status(StatusCode::OK), Ok(()));
        assert_eq!(
            map_status(StatusCode::TOO_MANY_REQUESTS),
            Err(TranslationError::RateLimited(429))
        );
        assert_eq!(
            map_status(StatusCode::FORBIDDEN),
            Err(TranslationError::Rejected(403))
        );
        assert_eq!(
            map_status(StatusCode::SERVICE_UNAVAILABLE),
            Err(TranslationError::Rejected(503))
        );
        assert!(map_status(StatusCode::TOO_MANY_REQUESTS)
            .unwrap_err()
            .is_retryable());
        assert!(!map_status(StatusCode::BAD_REQUEST)
            .unwrap_err()
            .is_retryable());
    }

    #[test]
    fn malformed_bodies_are_rejected() {
        assert!(matches!(
            parse_gtx_response(&json!({"error": "x"})),
            Err(TranslationError::Malformed(_))
        ));
        assert!(matches!(
            parse_gtx_response(&json!([[]])),
            Err(TranslationError::Malformed(_))
        ));
    }
}
