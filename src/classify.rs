// src/classify.rs
//! # Classifier / Aggregator
//! Pure logic that maps scored comments → category counts, star score and
//! one example comment per category. No I/O.
//!
//! Bins: [-1, 1] split by 4 evenly spaced edges into three right-closed
//! intervals, (-1, -1/3] Bad, (-1/3, 1/3] Regular, (1/3, 1] Good, with -1.0
//! itself counted as Bad. Star score weights Bad/Regular/Good as 1/3/5.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::sentiment::SentimentScores;

const SCORE_MIN: f64 = -1.0;
const SCORE_MAX: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Bad,
    Regular,
    Good,
}

impl Category {
    /// Ascending score order.
    pub const ALL: [Category; 3] = [Category::Bad, Category::Regular, Category::Good];

    pub fn weight(self) -> u32 {
        match self {
            Category::Bad => 1,
            Category::Regular => 3,
            Category::Good => 5,
        }
    }

    /// Label used on the chart and in the report.
    pub fn label_es(self) -> &'static str {
        match self {
            Category::Bad => "Mala",
            Category::Regular => "Regular",
            Category::Good => "Buena",
        }
    }

    pub fn from_score(score: f64) -> Self {
        let edges = bin_edges();
        let s = if score.is_nan() {
            0.0
        } else {
            score.clamp(SCORE_MIN, SCORE_MAX)
        };
        if s <= edges[1] {
            Category::Bad
        } else if s <= edges[2] {
            Category::Regular
        } else {
            Category::Good
        }
    }
}

/// Four evenly spaced points over [-1, 1], last one pinned to the bound.
pub fn bin_edges() -> [f64; 4] {
    let step = (SCORE_MAX - SCORE_MIN) / 3.0;
    [
        SCORE_MIN,
        SCORE_MIN + step,
        SCORE_MIN + 2.0 * step,
        SCORE_MAX,
    ]
}

/// One comment after translation, cleaning and scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredComment {
    /// Position in the original input batch.
    pub index: usize,
    /// Raw text as read from the sheet.
    pub original: String,
    pub translated: String,
    pub cleaned: String,
    pub scores: SentimentScores,
}

impl ScoredComment {
    pub fn polarity(&self) -> f64 {
        self.scores.compound
    }

    pub fn category(&self) -> Category {
        Category::from_score(self.polarity())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub bad: usize,
    pub regular: usize,
    pub good: usize,
}

impl CategoryCounts {
    pub fn get(&self, c: Category) -> usize {
        match c {
            Category::Bad => self.bad,
            Category::Regular => self.regular,
            Category::Good => self.good,
        }
    }

    fn bump(&mut self, c: Category) {
        match c {
            Category::Bad => self.bad += 1,
            Category::Regular => self.regular += 1,
            Category::Good => self.good += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.bad + self.regular + self.good
    }

    /// Σ count × weight / total. Fails on an empty tally.
    pub fn star_score(&self) -> Result<f64> {
        let total = self.total();
        if total == 0 {
            return Err(PipelineError::DegenerateBatch);
        }
        let weighted: u64 = Category::ALL
            .iter()
            .map(|&c| self.get(c) as u64 * u64::from(c.weight()))
            .sum();
        Ok(weighted as f64 / total as f64)
    }
}

/// Original comment text of the first comment seen in each category.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Examples {
    pub good: String,
    pub regular: String,
    pub bad: String,
}

impl Examples {
    pub fn get(&self, c: Category) -> &str {
        match c {
            Category::Bad => &self.bad,
            Category::Regular => &self.regular,
            Category::Good => &self.good,
        }
    }

    fn slot(&mut self, c: Category) -> &mut String {
        match c {
            Category::Bad => &mut self.bad,
            Category::Regular => &mut self.regular,
            Category::Good => &mut self.good,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub counts: CategoryCounts,
    pub total: usize,
    pub star_score: f64,
    pub examples: Examples,
}

impl AggregateResult {
    pub fn ratio(&self, c: Category) -> f64 {
        // total > 0 is guaranteed by `aggregate`
        self.counts.get(c) as f64 / self.total as f64
    }
}

/// Tally, rate and pick examples. Input order does not matter: examples are
/// chosen by ascending original index.
pub fn aggregate(batch: &[ScoredComment]) -> Result<AggregateResult> {
    if batch.is_empty() {
        return Err(PipelineError::DegenerateBatch);
    }

    let mut ordered: Vec<&ScoredComment> = batch.iter().collect();
    ordered.sort_by_key(|c| c.index);

    let mut counts = CategoryCounts::default();
    let mut seen = [false; 3];
    let mut examples = Examples::default();

    for c in ordered {
        let cat = c.category();
        counts.bump(cat);
        let slot = cat as usize;
        if !seen[slot] {
            seen[slot] = true;
            *examples.slot(cat) = c.original.clone();
        }
    }

    let star_score = counts.star_score()?;
    Ok(AggregateResult {
        counts,
        total: counts.total(),
        star_score,
        examples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk(index: usize, original: &str, compound: f64) -> ScoredComment {
        ScoredComment {
            index,
            original: original.to_string(),
            translated: String::new(),
            cleaned: String::new(),
            scores: SentimentScores {
                compound,
                ..Default::default()
            },
        }
    }

    #[test]
    fn edges_are_evenly_spaced() {
        let e = bin_edges();
        assert_eq!(e[0], -1.0);
        assert_eq!(e[3], 1.0);
        assert!((e[1] + 1.0 / 3.0).abs() < 1e-12);
        assert!((e[2] - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn boundaries_are_right_closed() {
        let e = bin_edges();
        assert_eq!(Category::from_score(-1.0), Category::Bad);
        assert_eq!(Category::from_score(e[1]), Category::Bad);
        assert_eq!(Category::from_score(e[1] + 1e-9), Category::Regular);
        assert_eq!(Category::from_score(0.0), Category::Regular);
        assert_eq!(Category::from_score(e[2]), Category::Regular);
        assert_eq!(Category::from_score(e[2] + 1e-9), Category::Good);
        assert_eq!(Category::from_score(1.0), Category::Good);
    }

    #[test]
    fn rounded_scores_near_a_third() {
        assert_eq!(Category::from_score(-0.3333), Category::Regular);
        assert_eq!(Category::from_score(-0.3334), Category::Bad);
        assert_eq!(Category::from_score(0.3333), Category::Regular);
        assert_eq!(Category::from_score(0.3334), Category::Good);
    }

    #[test]
    fn out_of_range_is_clamped() {
        assert_eq!(Category::from_score(-7.0), Category::Bad);
        assert_eq!(Category::from_score(3.0), Category::Good);
        assert_eq!(Category::from_score(f64::NAN), Category::Regular);
    }

    #[test]
    fn star_score_weighting() {
        let c = CategoryCounts {
            bad: 2,
            regular: 3,
            good: 5,
        };
        assert!((c.star_score().unwrap() - 3.6).abs() < 1e-12);
    }

    #[test]
    fn empty_counts_are_degenerate() {
        let c = CategoryCounts::default();
        assert!(matches!(c.star_score(), Err(PipelineError::DegenerateBatch)));
        assert!(matches!(aggregate(&[]), Err(PipelineError::DegenerateBatch)));
    }

    #[test]
    fn first_occurrence_examples() {
        let batch = vec![
            mk(0, "g0", 0.9),
            mk(1, "b1", -0.8),
            mk(2, "g2", 0.7),
            mk(3, "r3", 0.0),
            mk(4, "b4", -0.5),
        ];
        let r = aggregate(&batch).unwrap();
        assert_eq!(r.examples.good, "g0");
        assert_eq!(r.examples.bad, "b1");
        assert_eq!(r.examples.regular, "r3");
        assert_eq!(r.counts, CategoryCounts { bad: 2, regular: 1, good: 2 });
        assert_eq!(r.total, 5);
    }

    #[test]
    fn completion_order_does_not_change_examples() {
        let batch = vec![mk(3, "late", 0.9), mk(1, "early", 0.8)];
        let r = aggregate(&batch).unwrap();
        assert_eq!(r.examples.good, "early");
    }

    #[test]
    fn missing_category_has_empty_example_and_zero_count() {
        let r = aggregate(&[mk(0, "only good", 0.6)]).unwrap();
        assert_eq!(r.counts.bad, 0);
        assert_eq!(r.examples.bad, "");
        assert_eq!(r.examples.regular, "");
        assert_eq!(r.star_score, 5.0);
        assert_eq!(r.ratio(Category::Good), 1.0);
        assert_eq!(r.ratio(Category::Bad), 0.0);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let batch = vec![mk(0, "a", 0.1), mk(1, "b", -0.9), mk(2, "c", 0.95)];
        let a = aggregate(&batch).unwrap();
        let b = aggregate(&batch).unwrap();
        assert_eq!(a, b);
    }
}
