// src/config.rs
//! Run configuration. Every field has a default, so an absent file means
//! "grade the standard course export with the public translator".

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::sheet::SheetLayout;

pub const ENV_CONFIG_PATH: &str = "COURSE_SENTIMENT_CONFIG";
const DEFAULT_TOML: &str = "config/pipeline.toml";
const DEFAULT_JSON: &str = "config/pipeline.json";

const MAX_CONCURRENCY: usize = 64;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub sheet: SheetLayout,
    pub translate: TranslateConfig,
    pub resources: ResourcesConfig,
    pub report: ReportConfig,
}

/// What to do with a comment whose translation still fails after all retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Fail the whole run.
    #[default]
    Abort,
    /// Exclude the comment from grading and list it in the result.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    /// "google" | "identity" (case-insensitive)
    pub provider: String,
    pub endpoint: String,
    pub source_lang: String,
    pub target_lang: String,
    /// Max in-flight translation calls.
    pub concurrency: usize,
    pub max_attempts: u32,
    /// First retry delay; doubles on each further attempt.
    pub backoff_ms: u64,
    pub request_timeout_secs: u64,
    /// Whole-run budget for the translation stage.
    pub deadline_secs: Option<u64>,
    /// `None` disables the on-disk cache.
    pub cache_dir: Option<PathBuf>,
    pub on_failure: FailurePolicy,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            provider: "google".to_string(),
            endpoint: "https://translate.googleapis.com/translate_a/single".to_string(),
            source_lang: "es".to_string(),
            target_lang: "en".to_string(),
            concurrency: 8,
            max_attempts: 3,
            backoff_ms: 500,
            request_timeout_secs: 10,
            deadline_secs: None,
            cache_dir: Some(PathBuf::from("cache/translate")),
            on_failure: FailurePolicy::Abort,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourcesConfig {
    /// One stopword per line; defaults to the built-in English list.
    pub stopwords_path: Option<PathBuf>,
    /// VADER-format lexicon; defaults to the embedded one.
    pub lexicon_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub out_dir: PathBuf,
    pub author: String,
    pub chart_file: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
            author: String::new(),
            chart_file: "Opiniones.svg".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Clamp out-of-range values back into something runnable.
    pub fn sanitize(mut self) -> Self {
        let t = &mut self.translate;
        t.provider = t.provider.trim().to_ascii_lowercase();
        t.concurrency = t.concurrency.clamp(1, MAX_CONCURRENCY);
        t.max_attempts = t.max_attempts.max(1);
        t.request_timeout_secs = t.request_timeout_secs.max(1);
        self.sheet.stride = self.sheet.stride.max(1);
        if self.report.chart_file.trim().is_empty() {
            self.report.chart_file = ReportConfig::default().chart_file;
        }
        self
    }
}

/// Load from an explicit path. TOML or JSON, picked by extension.
pub fn load_config_from(path: &Path) -> Result<PipelineConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg: PipelineConfig = match ext.as_str() {
        "json" => serde_json::from_str(&content)
            .with_context(|| format!("parsing JSON config {}", path.display()))?,
        "toml" | "" => toml::from_str(&content)
            .with_context(|| format!("parsing TOML config {}", path.display()))?,
        other => return Err(anyhow!("unsupported config format: .{other}")),
    };
    Ok(cfg.sanitize())
}

/// Resolve the config:
/// 1) explicit path (CLI flag)
/// 2) $COURSE_SENTIMENT_CONFIG
/// 3) config/pipeline.toml
/// 4) config/pipeline.json
/// 5) built-in defaults
pub fn load_config_default(explicit: Option<&Path>) -> Result<PipelineConfig> {
    if let Some(p) = explicit {
        return load_config_from(p);
    }
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        }
        return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
    }
    for candidate in [DEFAULT_TOML, DEFAULT_JSON] {
        let p = PathBuf::from(candidate);
        if p.exists() {
            return load_config_from(&p);
        }
    }
    Ok(PipelineConfig::default())
}
