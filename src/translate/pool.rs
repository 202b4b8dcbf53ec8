// src/translate/pool.rs
//! Bounded-concurrency translation of a comment batch with per-comment retry.
//!
//! Completion order is arbitrary; outputs are re-sorted by original index.
//! Cancellation (token or deadline) drops every in-flight call and reports
//! how far the batch got instead of returning a truncated result.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{postprocess_translation, DynTranslator, Translator};
use crate::config::{FailurePolicy, TranslateConfig};
use crate::error::{PipelineError, Result, TranslationError};
use crate::normalize::PendingComment;

const MAX_BACKOFF: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Delay before attempt `attempt + 1`, doubling from `backoff`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    pub concurrency: usize,
    pub retry: RetryPolicy,
    pub on_failure: FailurePolicy,
    pub deadline: Option<Duration>,
}

impl From<&TranslateConfig> for PoolOptions {
    fn from(cfg: &TranslateConfig) -> Self {
        Self {
            concurrency: cfg.concurrency.max(1),
            retry: RetryPolicy {
                max_attempts: cfg.max_attempts.max(1),
                backoff: Duration::from_millis(cfg.backoff_ms),
            },
            on_failure: cfg.on_failure,
            deadline: cfg.deadline_secs.map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedComment {
    pub index: usize,
    pub original: String,
    /// Post-processed: ASCII, lowercase, punctuation-free.
    pub translated: String,
}

/// A comment left out of grading because translation kept failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedComment {
    pub index: usize,
    pub original: String,
    pub attempts: u32,
    pub error: TranslationError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationOutcome {
    /// Sorted by original index.
    pub translated: Vec<TranslatedComment>,
    /// Sorted by original index. Always empty under `FailurePolicy::Abort`.
    pub failed: Vec<FailedComment>,
}

/// Call the translator until it succeeds, a non-retryable error comes back,
/// or attempts run out. Err carries the last error and the attempts made.
pub async fn translate_with_retry(
    translator: &dyn Translator,
    text: &str,
    policy: &RetryPolicy,
) -> std::result::Result<String, (TranslationError, u32)> {
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        counter!("translate_attempts_total").increment(1);
        let t0 = Instant::now();
        match translator.translate(text).await {
            Ok(out) => {
                histogram!("translate_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
                return Ok(out);
            }
            Err(e) if e.is_retryable() && attempt < policy.max_attempts => {
                let delay = policy.delay(attempt);
                debug!(
                    provider = translator.name(),
                    attempt,
                    max = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "translation attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err((e, attempt)),
        }
    }
}

/// Translate every pending comment with at most `opts.concurrency` calls in flight.
pub async fn translate_batch(
    translator: DynTranslator,
    pending: Vec<PendingComment>,
    opts: PoolOptions,
    cancel: CancellationToken,
) -> Result<TranslationOutcome> {
    let total = pending.len();
    let retry = opts.retry;

    let results = stream::iter(pending)
        .map(|c| {
            let translator = Arc::clone(&translator);
            async move {
                let res = translate_with_retry(translator.as_ref(), &c.normalized, &retry).await;
                (c, res)
            }
        })
        .buffer_unordered(opts.concurrency.max(1));
    tokio::pin!(results);

    let deadline = async {
        match opts.deadline {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let mut outcome = TranslationOutcome::default();
    loop {
        let done = outcome.translated.len() + outcome.failed.len();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(completed = done, total, "translation cancelled");
                return Err(PipelineError::Cancelled { completed: done, total });
            }
            _ = &mut deadline => {
                warn!(completed = done, total, "translation deadline reached");
                cancel.cancel();
                return Err(PipelineError::Cancelled { completed: done, total });
            }
            next = results.next() => match next {
                Some((c, Ok(text))) => outcome.translated.push(TranslatedComment {
                    index: c.index,
                    original: c.original,
                    translated: postprocess_translation(&text),
                }),
                Some((c, Err((error, attempts)))) => {
                    counter!("translate_failures_total").increment(1);
                    warn!(index = c.index, attempts, error = %error, "translation failed");
                    match opts.on_failure {
                        FailurePolicy::Abort => {
                            return Err(PipelineError::Translation {
                                index: c.index,
                                attempts,
                                source: error,
                            });
                        }
                        FailurePolicy::Skip => outcome.failed.push(FailedComment {
                            index: c.index,
                            original: c.original,
                            attempts,
                            error,
                        }),
                    }
                }
                None => break,
            },
        }
    }

    outcome.translated.sort_by_key(|t| t.index);
    outcome.failed.sort_by_key(|f| f.index);
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let p = RetryPolicy {
            max_attempts: 10,
            backoff: Duration::from_millis(500),
        };
        assert_eq!(p.delay(1), Duration::from_millis(500));
        assert_eq!(p.delay(2), Duration::from_millis(1000));
        assert_eq!(p.delay(3), Duration::from_millis(2000));
        assert_eq!(p.delay(20), MAX_BACKOFF);
    }

    #[test]
    fn options_follow_config() {
        let cfg = TranslateConfig {
            concurrency: 0,
            max_attempts: 5,
            backoff_ms: 20,
            deadline_secs: Some(30),
            on_failure: FailurePolicy::Skip,
            ..Default::default()
        };
        let o = PoolOptions::from(&cfg);
        assert_eq!(o.concurrency, 1);
        assert_eq!(o.retry.max_attempts, 5);
        assert_eq!(o.retry.backoff, Duration::from_millis(20));
        assert_eq!(o.deadline, Some(Duration::from_secs(30)));
        assert_eq!(o.on_failure, FailurePolicy::Skip);
    }
}
