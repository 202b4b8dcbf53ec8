// src/translate/mod.rs
//! Translation: provider abstraction + post-processing into plain ASCII English.

pub mod cache;
pub mod google;
pub mod pool;

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use regex::Regex;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::config::TranslateConfig;
use crate::error::{PipelineError, Result, TranslationError};

pub use cache::CachingTranslator;
pub use google::GoogleTranslator;
pub use pool::{translate_batch, PoolOptions, RetryPolicy, TranslationOutcome};

/// A Spanish → English translation backend.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> std::result::Result<String, TranslationError>;
    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

pub type DynTranslator = Arc<dyn Translator>;

/// Returns its input unchanged. Used for offline runs and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTranslator;

#[async_trait]
impl Translator for IdentityTranslator {
    async fn translate(&self, text: &str) -> std::result::Result<String, TranslationError> {
        if text.trim().is_empty() {
            return Err(TranslationError::EmptyInput);
        }
        Ok(text.to_string())
    }
    fn name(&self) -> &'static str {
        "identity"
    }
}

/// Factory: build a translator according to config and environment.
///
/// * `TRANSLATE_TEST_MODE=mock` forces the identity translator.
/// * `google` goes through the on-disk cache when `cache_dir` is set.
pub fn build_translator(cfg: &TranslateConfig) -> Result<DynTranslator> {
    if std::env::var("TRANSLATE_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Ok(Arc::new(IdentityTranslator));
    }

    match cfg.provider.as_str() {
        "identity" => Ok(Arc::new(IdentityTranslator)),
        "google" => {
            let google = GoogleTranslator::new(cfg)?;
            match &cfg.cache_dir {
                Some(dir) => Ok(Arc::new(CachingTranslator::new(
                    google,
                    dir.clone(),
                    &cfg.source_lang,
                    &cfg.target_lang,
                ))),
                None => Ok(Arc::new(google)),
            }
        }
        other => Err(PipelineError::Config(format!(
            "unsupported translation provider: {other:?}"
        ))),
    }
}

/// Closest-ASCII rendering: decompose, drop combining marks, map a few
/// letters that have no decomposition, drop anything else non-ASCII.
pub fn transliterate(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.nfd() {
        if c.is_ascii() {
            out.push(c);
        } else if is_combining_mark(c) {
            continue;
        } else if let Some(rep) = ascii_fallback(c) {
            out.push_str(rep);
        } else if c.is_whitespace() {
            out.push(' ');
        }
    }
    out
}

fn ascii_fallback(c: char) -> Option<&'static str> {
    Some(match c {
        'ß' => "ss",
        'æ' => "ae",
        'Æ' => "AE",
        'œ' => "oe",
        'Œ' => "OE",
        'ø' => "o",
        'Ø' => "O",
        'đ' | 'ð' => "d",
        'Đ' | 'Ð' => "D",
        'ł' => "l",
        'Ł' => "L",
        'þ' => "th",
        'Þ' => "Th",
        'ı' => "i",
        '¿' => "?",
        '¡' => "!",
        '«' | '»' | '\u{201C}' | '\u{201D}' => "\"",
        '\u{2018}' | '\u{2019}' => "'",
        '\u{2013}' | '\u{2014}' => "-",
        '\u{2026}' => "...",
        '€' => "EUR",
        _ => return None,
    })
}

/// Transliterate, lowercase, keep only word characters and whitespace.
pub fn postprocess_translation(s: &str) -> String {
    static RE_PUNCT: OnceCell<Regex> = OnceCell::new();
    let re = RE_PUNCT.get_or_init(|| Regex::new(r"[^\w\s]").unwrap());
    let lowered = transliterate(s).to_lowercase();
    re.replace_all(&lowered, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transliterates_spanish_and_friends() {
        assert_eq!(transliterate("canción año Über straße"), "cancion ano Uber strasse");
        assert_eq!(transliterate("¿qué?"), "?que?");
    }

    #[test]
    fn postprocess_strips_punctuation_and_lowercases() {
        assert_eq!(
            postprocess_translation("The course was GREAT, I'd recommend it!"),
            "the course was great id recommend it"
        );
        assert_eq!(postprocess_translation("“Muy” útil…"), "muy util");
    }

    #[test]
    fn postprocess_output_is_ascii() {
        let out = postprocess_translation("naïve café — déjà vu 東京");
        assert!(out.is_ascii());
        assert!(out.chars().all(|c| c.is_alphanumeric() || c == '_' || c.is_whitespace()));
    }

    #[tokio::test]
    async fn identity_rejects_empty() {
        let t = IdentityTranslator;
        assert_eq!(t.translate("  ").await, Err(TranslationError::EmptyInput));
        assert_eq!(t.translate("hola").await.unwrap(), "hola");
    }

    #[test]
    fn unknown_provider_is_config_error() {
        let cfg = TranslateConfig {
            provider: "babelfish".into(),
            ..Default::default()
        };
        assert!(matches!(
            build_translator(&cfg),
            Err(PipelineError::Config(_))
        ));
    }
}
