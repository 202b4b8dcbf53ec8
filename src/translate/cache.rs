// src/translate/cache.rs
//! File cache in front of a translation provider. Cache hits never reach the
//! network and are not counted as attempts.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use metrics::counter;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::Translator;
use crate::error::TranslationError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct CacheEntry {
    source: String,
    translation: String,
}

pub struct CachingTranslator<T: Translator> {
    inner: T,
    cache_dir: PathBuf,
    /// Language pair folded into the key so caches never mix directions.
    pair: String,
}

impl<T: Translator> CachingTranslator<T> {
    pub fn new(inner: T, cache_dir: PathBuf, source_lang: &str, target_lang: &str) -> Self {
        let _ = fs::create_dir_all(&cache_dir); // best-effort
        Self {
            inner,
            cache_dir,
            pair: format!("{source_lang}:{target_lang}"),
        }
    }

    fn key(&self, text: &str) -> String {
        let mut h = Sha256::new();
        h.update(self.pair.as_bytes());
        h.update([0u8]);
        h.update(text.as_bytes());
        format!("{:x}", h.finalize())
    }
}

#[async_trait]
impl<T: Translator> Translator for CachingTranslator<T> {
    async fn translate(&self, text: &str) -> Result<String, TranslationError> {
        let key = self.key(text);
        if let Some(hit) = read_cache_file(&self.cache_dir, &key) {
            if hit.source == text {
                counter!("translate_cache_hits_total").increment(1);
                return Ok(hit.translation);
            }
        }

        let fresh = self.inner.translate(text).await?;
        let entry = CacheEntry {
            source: text.to_string(),
            translation: fresh.clone(),
        };
        if let Err(e) = write_cache_file(&self.cache_dir, &key, &entry) {
            tracing::warn!(error = %e, key = %key, "translation cache write failed");
        }
        Ok(fresh)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

fn cache_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{key}.json"))
}

fn read_cache_file(dir: &Path, key: &str) -> Option<CacheEntry> {
    let raw = fs::read_to_string(cache_path(dir, key)).ok()?;
    serde_json::from_str(&raw).ok()
}

/// Per-process sequence for temp file names.
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Writers of the same key each get their own temp file; the rename is atomic,
/// so readers see one complete entry or none.
fn write_cache_file(dir: &Path, key: &str, value: &CacheEntry) -> io::Result<()> {
    let path = cache_path(dir, key);
    let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
    let tmp = dir.join(format!("{key}.{}.{seq}.tmp", std::process::id()));
    let json = serde_json::to_string(value).map_err(io::Error::other)?;
    let mut f = fs::File::create(&tmp)?;
    f.write_all(json.as_bytes())?;
    fs::rename(tmp, path)?;
    Ok(())
}
