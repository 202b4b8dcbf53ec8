// src/normalize.rs
//! Comment normalization and the pre-translation filter.

use once_cell::sync::OnceCell;
use regex::Regex;

/// A comment cell as read from the sheet. `None` is an empty/missing cell.
pub type RawComment = Option<String>;

/// Textual placeholders spreadsheet exports write for missing cells.
const MISSING_SENTINELS: &[&str] = &["nan"];

/// True when the cell is absent, blank, or a missing-value placeholder.
pub fn is_missing_or_blank(raw: &RawComment) -> bool {
    match raw.as_deref().map(str::trim) {
        None | Some("") => true,
        Some(s) => MISSING_SENTINELS.iter().any(|m| s.eq_ignore_ascii_case(m)),
    }
}

/// Trim, lowercase, keep only letters (incl. á é í ó ú ñ) and whitespace.
pub fn normalize(raw: &str) -> String {
    static RE_SPECIAL: OnceCell<Regex> = OnceCell::new();
    let re = RE_SPECIAL.get_or_init(|| Regex::new(r"[^a-zA-Z\sáéíóúñ]").unwrap());
    let lowered = raw.trim().to_lowercase();
    re.replace_all(&lowered, "").into_owned()
}

/// A comment that survived the pre-filter, tied to its batch position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingComment {
    /// Position in the original input batch.
    pub index: usize,
    /// Text exactly as read from the sheet.
    pub original: String,
    pub normalized: String,
}

/// Normalize every raw comment and drop the ones with nothing left to translate.
/// Returns (kept, filtered_count). Order of `kept` follows the input batch.
pub fn prefilter(raw: &[RawComment]) -> (Vec<PendingComment>, usize) {
    let mut kept = Vec::with_capacity(raw.len());
    let mut filtered_out = 0usize;

    for (index, cell) in raw.iter().enumerate() {
        if is_missing_or_blank(cell) {
            filtered_out += 1;
            continue;
        }
        let original = cell.clone().unwrap_or_default();
        let normalized = normalize(&original);
        if is_missing_or_blank(&Some(normalized.clone())) {
            filtered_out += 1;
            continue;
        }
        kept.push(PendingComment {
            index,
            original,
            normalized,
        });
    }

    (kept, filtered_out)
}
