// src/resources.rs
//! Immutable language resources, built once per process and shared by reference.

use crate::config::ResourcesConfig;
use crate::error::{PipelineError, Result};
use crate::sentiment::{Lexicon, PolarityScorer};
use crate::stopwords::StopwordFilter;

#[derive(Debug, Clone)]
pub struct Resources {
    pub stopwords: StopwordFilter,
    pub lexicon: Lexicon,
}

impl Resources {
    /// Built-in stopword list and lexicon.
    pub fn builtin() -> Result<Self> {
        Self::load(&ResourcesConfig::default())
    }

    pub fn load(cfg: &ResourcesConfig) -> Result<Self> {
        let stopwords = match &cfg.stopwords_path {
            Some(p) => StopwordFilter::from_file(p).map_err(resource_err)?,
            None => StopwordFilter::english(),
        };
        let lexicon = match &cfg.lexicon_path {
            Some(p) => Lexicon::from_file(p).map_err(resource_err)?,
            None => Lexicon::builtin().map_err(resource_err)?,
        };
        tracing::info!(
            stopwords = stopwords.len(),
            lexicon = lexicon.len(),
            "language resources loaded"
        );
        Ok(Self { stopwords, lexicon })
    }

    pub fn scorer(&self) -> PolarityScorer<'_> {
        PolarityScorer::new(&self.lexicon)
    }
}

fn resource_err(e: anyhow::Error) -> PipelineError {
    PipelineError::Resource(format!("{e:#}"))
}
