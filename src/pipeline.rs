// src/pipeline.rs
//! Grading pipeline entry:
//! 1) normalize + pre-filter raw comments
//! 2) translate on a bounded pool (retry/backoff, cancellation)
//! 3) stopword filter + polarity score
//! 4) bucket, count, rate, pick examples

use std::path::{Path, PathBuf};
use std::sync::Arc;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::classify::{aggregate, AggregateResult, ScoredComment};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::normalize::{prefilter, RawComment};
use crate::resources::Resources;
use crate::sheet::{read_comments, SheetLayout};
use crate::translate::pool::{FailedComment, TranslatedComment};
use crate::translate::{build_translator, translate_batch, DynTranslator, PoolOptions};

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("pipeline_comments_total", "Raw comments read per run.");
        describe_counter!(
            "pipeline_comments_filtered_total",
            "Comments dropped as missing/blank after normalization."
        );
        describe_counter!("translate_attempts_total", "Translation calls made.");
        describe_counter!(
            "translate_failures_total",
            "Comments whose translation failed after all retries."
        );
        describe_counter!(
            "translate_cache_hits_total",
            "Translations served from the on-disk cache."
        );
        describe_histogram!("translate_ms", "Successful translation call time in milliseconds.");
        describe_gauge!("pipeline_star_score", "Star score of the last graded batch.");
    });
}

/// Everything a run produces for the report renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeReport {
    pub aggregate: AggregateResult,
    /// Graded comments in original order.
    pub scored: Vec<ScoredComment>,
    /// Comments excluded because translation failed (skip policy only).
    pub failed: Vec<FailedComment>,
    /// Raw comments dropped before translation.
    pub filtered: usize,
    /// Raw comments read.
    pub read: usize,
}

pub struct Pipeline {
    resources: Arc<Resources>,
    translator: DynTranslator,
    opts: PoolOptions,
}

impl Pipeline {
    pub fn new(resources: Arc<Resources>, translator: DynTranslator, opts: PoolOptions) -> Self {
        Self {
            resources,
            translator,
            opts,
        }
    }

    /// Load resources and build the translator described by `cfg`.
    pub fn from_config(cfg: &PipelineConfig) -> Result<Self> {
        let resources = Arc::new(Resources::load(&cfg.resources)?);
        let translator = build_translator(&cfg.translate)?;
        info!(provider = translator.name(), "translator ready");
        Ok(Self::new(
            resources,
            translator,
            PoolOptions::from(&cfg.translate),
        ))
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    /// Stopword-filter and score already translated comments, keeping order.
    pub fn clean_and_score(&self, translated: Vec<TranslatedComment>) -> Vec<ScoredComment> {
        let scorer = self.resources.scorer();
        translated
            .into_iter()
            .map(|t| {
                let cleaned = self.resources.stopwords.filter(&t.translated);
                let scores = scorer.scores(&cleaned);
                ScoredComment {
                    index: t.index,
                    original: t.original,
                    translated: t.translated,
                    cleaned,
                    scores,
                }
            })
            .collect()
    }

    pub async fn run(&self, raw: &[RawComment], cancel: CancellationToken) -> Result<GradeReport> {
        ensure_metrics_described();

        let (pending, filtered) = prefilter(raw);
        counter!("pipeline_comments_total").increment(raw.len() as u64);
        counter!("pipeline_comments_filtered_total").increment(filtered as u64);
        info!(
            read = raw.len(),
            kept = pending.len(),
            filtered,
            "comments normalized"
        );
        if pending.is_empty() {
            return Err(PipelineError::DegenerateBatch);
        }

        let mut outcome =
            translate_batch(Arc::clone(&self.translator), pending, self.opts, cancel).await?;
        info!(
            translated = outcome.translated.len(),
            failed = outcome.failed.len(),
            "translation finished"
        );
        // Nothing left to grade under the skip policy: report why.
        if outcome.translated.is_empty() {
            if let Some(first) = std::mem::take(&mut outcome.failed).into_iter().next() {
                warn!(index = first.index, "every comment failed translation");
                return Err(PipelineError::Translation {
                    index: first.index,
                    attempts: first.attempts,
                    source: first.error,
                });
            }
        }

        let scored = self.clean_and_score(outcome.translated);
        let aggregate = aggregate(&scored)?;
        gauge!("pipeline_star_score").set(aggregate.star_score);
        info!(
            total = aggregate.total,
            good = aggregate.counts.good,
            regular = aggregate.counts.regular,
            bad = aggregate.counts.bad,
            stars = aggregate.star_score,
            "batch graded"
        );

        Ok(GradeReport {
            aggregate,
            scored,
            failed: outcome.failed,
            filtered,
            read: raw.len(),
        })
    }

    /// Read the sheet at `path` and grade it.
    pub async fn run_sheet(
        &self,
        path: &Path,
        layout: &SheetLayout,
        cancel: CancellationToken,
    ) -> Result<GradeReport> {
        let path: PathBuf = path.to_path_buf();
        let layout = layout.clone();
        let raw = tokio::task::spawn_blocking(move || read_comments(&path, &layout))
            .await
            .map_err(|e| PipelineError::Input(format!("sheet reader task failed: {e}")))??;
        self.run(&raw, cancel).await
    }
}
