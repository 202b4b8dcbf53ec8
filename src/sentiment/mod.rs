// src/sentiment/mod.rs
//! VADER-style polarity scoring: lexicon valences adjusted by boosters,
//! negation, idioms, contrastive "but", caps and punctuation emphasis.

pub mod lexicon;

pub use lexicon::Lexicon;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

const B_INCR: f64 = 0.293;
const B_DECR: f64 = -0.293;
const C_INCR: f64 = 0.733;
const N_SCALAR: f64 = -0.74;
/// Normalization constant: approximates the max expected raw sum.
const ALPHA: f64 = 15.0;

const NEGATE: &[&str] = &[
    "aint", "arent", "cannot", "cant", "couldnt", "darent", "didnt", "doesnt", "ain't", "aren't",
    "can't", "couldn't", "daren't", "didn't", "doesn't", "dont", "hadnt", "hasnt", "havent",
    "isnt", "mightnt", "mustnt", "neither", "don't", "hadn't", "hasn't", "haven't", "isn't",
    "mightn't", "mustn't", "neednt", "needn't", "never", "none", "nope", "nor", "not", "nothing",
    "nowhere", "oughtnt", "shant", "shouldnt", "uhuh", "wasnt", "werent", "oughtn't", "shan't",
    "shouldn't", "uh-uh", "wasn't", "weren't", "without", "wont", "wouldnt", "won't", "wouldn't",
    "rarely", "seldom", "despite",
];

/// Intensity shift contributed by a booster/dampener word or phrase.
fn booster(token: &str) -> Option<f64> {
    match token {
        "absolutely" | "amazingly" | "awfully" | "completely" | "considerably" | "decidedly"
        | "deeply" | "effing" | "enormously" | "entirely" | "especially" | "exceptionally"
        | "extremely" | "fabulously" | "flipping" | "flippin" | "fricking" | "frickin"
        | "frigging" | "friggin" | "fully" | "fucking" | "greatly" | "hella" | "highly"
        | "hugely" | "incredibly" | "intensely" | "majorly" | "more" | "most" | "particularly"
        | "purely" | "quite" | "really" | "remarkably" | "so" | "substantially" | "thoroughly"
        | "totally" | "tremendously" | "uber" | "unbelievably" | "unusually" | "utterly"
        | "very" => Some(B_INCR),
        "almost" | "barely" | "hardly" | "just enough" | "kind of" | "kinda" | "kindof"
        | "kind-of" | "less" | "little" | "marginally" | "occasionally" | "partly"
        | "scarcely" | "slightly" | "somewhat" | "sort of" | "sorta" | "sortof" | "sort-of" => {
            Some(B_DECR)
        }
        _ => None,
    }
}

fn idiom(seq: &str) -> Option<f64> {
    match seq {
        "the shit" | "the bomb" => Some(3.0),
        "bad ass" => Some(1.5),
        "yeah right" => Some(-2.0),
        "cut the mustard" => Some(2.0),
        "kiss of death" => Some(-1.5),
        "hand to mouth" => Some(-2.0),
        _ => None,
    }
}

/// Per-text scores. `compound` is the polarity score used for grading.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SentimentScores {
    pub neg: f64,
    pub neu: f64,
    pub pos: f64,
    pub compound: f64,
}

/// Lexicon-backed scorer. Cheap to construct; borrows the shared lexicon.
#[derive(Debug, Clone, Copy)]
pub struct PolarityScorer<'a> {
    lexicon: &'a Lexicon,
}

impl<'a> PolarityScorer<'a> {
    pub fn new(lexicon: &'a Lexicon) -> Self {
        Self { lexicon }
    }

    /// Compound polarity in [-1, 1]; 0.0 for empty input.
    pub fn score(&self, text: &str) -> f64 {
        self.scores(text).compound
    }

    pub fn scores(&self, text: &str) -> SentimentScores {
        let words = words_and_emoticons(text);
        let lowered: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
        let is_cap_diff = allcap_differential(&words);

        // A repeated token is scored in the context of its first occurrence,
        // matching the reference VADER scores.
        let mut first_seen: HashMap<&str, usize> = HashMap::new();
        for (pos, w) in words.iter().enumerate() {
            first_seen.entry(w.as_str()).or_insert(pos);
        }

        let mut sentiments = Vec::with_capacity(words.len());
        for word in &words {
            let i = first_seen[word.as_str()];
            let item = lowered[i].as_str();
            let kind_of = item == "kind" && lowered.get(i + 1).map(String::as_str) == Some("of");
            if kind_of || booster(item).is_some() {
                sentiments.push(0.0);
                continue;
            }
            sentiments.push(self.sentiment_valence(&words, &lowered, i, is_cap_diff));
        }

        but_check(&lowered, &mut sentiments);
        score_valence(&sentiments, text)
    }

    fn sentiment_valence(
        &self,
        words: &[String],
        lowered: &[String],
        i: usize,
        is_cap_diff: bool,
    ) -> f64 {
        let Some(mut valence) = self.lexicon.valence(&lowered[i]) else {
            return 0.0;
        };

        if is_cap_diff && is_upper(&words[i]) {
            valence += if valence > 0.0 { C_INCR } else { -C_INCR };
        }

        for start_i in 0..3 {
            if i <= start_i || self.lexicon.contains(&lowered[i - (start_i + 1)]) {
                continue;
            }
            let prev = &words[i - (start_i + 1)];
            let mut s = scalar_inc_dec(prev, valence, is_cap_diff);
            match start_i {
                1 => s *= 0.95,
                2 => s *= 0.9,
                _ => {}
            }
            valence += s;
            valence = never_check(valence, lowered, start_i, i);
            if start_i == 2 {
                valence = idioms_check(valence, lowered, i);
            }
        }

        self.least_check(valence, lowered, i)
    }

    fn least_check(&self, valence: f64, lowered: &[String], i: usize) -> f64 {
        if i > 0 && lowered[i - 1] == "least" && !self.lexicon.contains(&lowered[i - 1]) {
            if i > 1 {
                if lowered[i - 2] != "at" && lowered[i - 2] != "very" {
                    return valence * N_SCALAR;
                }
                return valence;
            }
            return valence * N_SCALAR;
        }
        valence
    }
}

/// Whitespace tokens of length > 1 with surrounding punctuation removed
/// (kept as-is when stripping would leave ≤ 1 char, e.g. emoticons).
fn words_and_emoticons(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter(|w| w.chars().count() > 1)
        .map(|w| {
            let stripped = w.trim_matches(|c: char| c.is_ascii_punctuation());
            if stripped.chars().count() <= 1 {
                w.to_string()
            } else {
                stripped.to_string()
            }
        })
        .collect()
}

fn is_upper(word: &str) -> bool {
    word.chars().any(char::is_uppercase) && !word.chars().any(char::is_lowercase)
}

/// True when some, but not all, tokens are ALL CAPS.
fn allcap_differential(words: &[String]) -> bool {
    let caps = words.iter().filter(|w| is_upper(w)).count();
    caps > 0 && caps < words.len()
}

fn negated(word: &str) -> bool {
    let w = word.to_lowercase();
    NEGATE.contains(&w.as_str()) || w.contains("n't")
}

fn scalar_inc_dec(word: &str, valence: f64, is_cap_diff: bool) -> f64 {
    let Some(mut scalar) = booster(&word.to_lowercase()) else {
        return 0.0;
    };
    if valence < 0.0 {
        scalar *= -1.0;
    }
    if is_upper(word) && is_cap_diff {
        scalar += if valence > 0.0 { C_INCR } else { -C_INCR };
    }
    scalar
}

fn never_check(valence: f64, w: &[String], start_i: usize, i: usize) -> f64 {
    let so_or_this = |t: &str| t == "so" || t == "this";
    match start_i {
        0 if negated(&w[i - 1]) => valence * N_SCALAR,
        1 if w[i - 2] == "never" && so_or_this(&w[i - 1]) => valence * 1.5,
        1 if negated(&w[i - 2]) => valence * N_SCALAR,
        2 if (w[i - 3] == "never" && so_or_this(&w[i - 2])) || so_or_this(&w[i - 1]) => {
            valence * 1.25
        }
        2 if negated(&w[i - 3]) => valence * N_SCALAR,
        _ => valence,
    }
}

/// Only reached with i >= 3.
fn idioms_check(mut valence: f64, w: &[String], i: usize) -> f64 {
    let onezero = format!("{} {}", w[i - 1], w[i]);
    let twoonezero = format!("{} {} {}", w[i - 2], w[i - 1], w[i]);
    let twoone = format!("{} {}", w[i - 2], w[i - 1]);
    let threetwoone = format!("{} {} {}", w[i - 3], w[i - 2], w[i - 1]);
    let threetwo = format!("{} {}", w[i - 3], w[i - 2]);

    for seq in [&onezero, &twoonezero, &twoone, &threetwoone, &threetwo] {
        if let Some(v) = idiom(seq) {
            valence = v;
            break;
        }
    }
    if w.len() - 1 > i {
        if let Some(v) = idiom(&format!("{} {}", w[i], w[i + 1])) {
            valence = v;
        }
    }
    if w.len() - 1 > i + 1 {
        if let Some(v) = idiom(&format!("{} {} {}", w[i], w[i + 1], w[i + 2])) {
            valence = v;
        }
    }
    if booster(&threetwo).is_some() || booster(&twoone).is_some() {
        valence += B_DECR;
    }
    valence
}

/// Sentiment before "but" is halved, after it amplified by half.
fn but_check(lowered: &[String], sentiments: &mut [f64]) {
    let Some(bi) = lowered.iter().position(|w| w == "but") else {
        return;
    };
    for (idx, s) in sentiments.iter_mut().enumerate() {
        if idx < bi {
            *s *= 0.5;
        } else if idx > bi {
            *s *= 1.5;
        }
    }
}

fn punctuation_emphasis(text: &str) -> f64 {
    let ep = text.matches('!').count().min(4) as f64 * 0.292;
    let qm = text.matches('?').count();
    let qm_amp = match qm {
        0 | 1 => 0.0,
        2..=3 => qm as f64 * 0.18,
        _ => 0.96,
    };
    ep + qm_amp
}

/// Map an unbounded valence sum into [-1, 1].
pub fn normalize_score(score: f64) -> f64 {
    (score / (score * score + ALPHA).sqrt()).clamp(-1.0, 1.0)
}

fn round_to(x: f64, places: i32) -> f64 {
    let m = 10f64.powi(places);
    (x * m).round() / m
}

fn score_valence(sentiments: &[f64], text: &str) -> SentimentScores {
    if sentiments.is_empty() {
        return SentimentScores::default();
    }

    let amp = punctuation_emphasis(text);
    let mut sum: f64 = sentiments.iter().sum();
    if sum > 0.0 {
        sum += amp;
    } else if sum < 0.0 {
        sum -= amp;
    }
    let compound = normalize_score(sum);

    let (mut pos_sum, mut neg_sum, mut neu_count) = (0.0f64, 0.0f64, 0usize);
    for &s in sentiments {
        if s > 0.0 {
            pos_sum += s + 1.0;
        } else if s < 0.0 {
            neg_sum += s - 1.0;
        } else {
            neu_count += 1;
        }
    }
    if pos_sum > neg_sum.abs() {
        pos_sum += amp;
    } else if pos_sum < neg_sum.abs() {
        neg_sum -= amp;
    }

    let total = pos_sum + neg_sum.abs() + neu_count as f64;
    SentimentScores {
        neg: round_to((neg_sum / total).abs(), 3),
        neu: round_to((neu_count as f64 / total).abs(), 3),
        pos: round_to((pos_sum / total).abs(), 3),
        compound: round_to(compound, 4),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex() -> Lexicon {
        Lexicon::builtin().unwrap()
    }

    #[test]
    fn single_words_match_reference_values() {
        let l = lex();
        let s = PolarityScorer::new(&l);
        assert_eq!(s.score("good"), 0.4404);
        assert_eq!(s.score("great"), 0.6249);
        assert_eq!(s.score("bad"), -0.5423);
    }

    #[test]
    fn booster_and_negation() {
        let l = lex();
        let s = PolarityScorer::new(&l);
        assert_eq!(s.score("very good"), 0.4927);
        assert_eq!(s.score("not good"), -0.3412);
    }

    #[test]
    fn empty_and_unknown_are_neutral() {
        let l = lex();
        let s = PolarityScorer::new(&l);
        assert_eq!(s.score(""), 0.0);
        assert_eq!(s.score("course syllabus lecture"), 0.0);
        let d = s.scores("course syllabus");
        assert_eq!(d.neu, 1.0);
    }

    #[test]
    fn repeated_token_reuses_first_occurrence_context() {
        let l = lex();
        let s = PolarityScorer::new(&l);
        // the second "good" is read where the first one sits, unnegated
        assert_eq!(s.score("good not good"), 0.7003);
        assert_eq!(s.score("good not good"), s.score("good good"));
        // case matters for repetition: "Good" and "good" are different tokens
        assert_eq!(s.score("Good not good"), 0.1265);
    }

    #[test]
    fn but_shifts_weight_to_second_clause() {
        let l = lex();
        let s = PolarityScorer::new(&l);
        assert!(s.score("good but boring") < 0.0);
    }

    #[test]
    fn exclamation_amplifies() {
        let l = lex();
        let s = PolarityScorer::new(&l);
        assert!(s.score("good!!!") > s.score("good"));
    }

    #[test]
    fn caps_emphasis_only_when_mixed() {
        let l = lex();
        let s = PolarityScorer::new(&l);
        assert!(s.score("course GOOD") > s.score("course good"));
        assert_eq!(s.score("GOOD"), s.score("good"));
    }

    #[test]
    fn bounded_for_long_positive_text() {
        let l = lex();
        let s = PolarityScorer::new(&l);
        let text = "excellent amazing wonderful perfect great ".repeat(30);
        let v = s.score(&text);
        assert!((-1.0..=1.0).contains(&v));
        assert!(v > 0.99);
    }

    #[test]
    fn single_char_tokens_ignored() {
        let l = lex();
        let s = PolarityScorer::new(&l);
        assert_eq!(s.score("a b c good"), s.score("good"));
    }
}
