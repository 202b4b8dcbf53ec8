// src/sentiment/lexicon.rs
//! Valence lexicon in the VADER text format: `token<TAB>mean<TAB>std<TAB>ratings`.
//! Only the first two columns are read.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};

const BUILTIN: &str = include_str!("../../assets/vader_lexicon.txt");

#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    valences: HashMap<String, f64>,
}

impl Lexicon {
    /// The lexicon embedded in the binary.
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN).context("parsing built-in lexicon")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading lexicon from {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing lexicon {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let mut valences = HashMap::new();
        for (no, line) in raw.lines().enumerate() {
            let line = line.trim_end_matches(['\r', '\n']);
            // "# " marks a comment; bare '#' starts several emoticon entries.
            if line.trim().is_empty() || line.starts_with("# ") {
                continue;
            }
            let mut cols = line.split('\t');
            let token = cols.next().unwrap_or_default().trim();
            let value = cols
                .next()
                .ok_or_else(|| anyhow!("line {}: missing valence column", no + 1))?;
            let value: f64 = value
                .trim()
                .parse()
                .with_context(|| format!("line {}: bad valence {value:?}", no + 1))?;
            if token.is_empty() {
                return Err(anyhow!("line {}: empty token", no + 1));
            }
            valences.insert(token.to_string(), value);
        }
        Ok(Self { valences })
    }

    #[inline]
    pub fn valence(&self, token: &str) -> Option<f64> {
        self.valences.get(token).copied()
    }

    #[inline]
    pub fn contains(&self, token: &str) -> bool {
        self.valences.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.valences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valences.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_parses() {
        let lex = Lexicon::builtin().unwrap();
        assert!(lex.len() > 1000);
        assert_eq!(lex.valence("good"), Some(1.9));
        assert_eq!(lex.valence("bad"), Some(-2.5));
        assert_eq!(lex.valence("course"), None);
    }

    #[test]
    fn builtin_covers_everyday_praise() {
        let lex = Lexicon::builtin().unwrap();
        for (word, v) in [
            ("kind", 2.4),
            ("wow", 2.8),
            ("joy", 2.8),
            ("smart", 1.7),
            ("free", 2.3),
            ("useful", 1.9),
            ("disorganized", -1.2),
        ] {
            assert_eq!(lex.valence(word), Some(v), "{word}");
        }
    }

    #[test]
    fn two_column_lines_parse() {
        let lex = Lexicon::parse("kind\t2.4\n").unwrap();
        assert_eq!(lex.valence("kind"), Some(2.4));
    }

    #[test]
    fn emoticons_with_hash_are_entries() {
        let lex = Lexicon::parse("# comment\n#-)\t1.1\t0.3\t[1, 1]\nmeh\t-0.3\t0.5\n").unwrap();
        assert_eq!(lex.len(), 2);
        assert_eq!(lex.valence("#-)"), Some(1.1));
    }

    #[test]
    fn rejects_missing_valence() {
        let err = Lexicon::parse("good\n").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }
}
