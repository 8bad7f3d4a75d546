//! Tie-aware ranking of the competitors in a single event.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A scored competitor handed to [`rank`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankInput {
    /// Primary score; missing counts as 0
    #[serde(default)]
    pub score: f64,

    /// Secondary component, compared only when scores are equal
    #[serde(default)]
    pub tie_breaker: f64,
}

impl RankInput {
    pub fn new(score: f64) -> Self {
        Self {
            score,
            tie_breaker: 0.0,
        }
    }

    pub fn with_tie_breaker(mut self, tie_breaker: f64) -> Self {
        self.tie_breaker = tie_breaker;
        self
    }

    fn sanitized(self) -> Self {
        Self {
            score: finite_or_zero(self.score),
            tie_breaker: finite_or_zero(self.tie_breaker),
        }
    }
}

/// Rank data for one competitor, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    pub score: f64,
    pub tie_breaker: f64,

    /// Position in the input (0-based)
    pub index: usize,

    /// Competition rank (1-based, tied entries share a position)
    pub position: u32,

    /// 0 = best, 1 = worst; `None` when nobody can be told apart
    pub normalized_position: Option<f64>,

    /// `index / (n - 1)`; `None` for a single competitor
    pub normalized_index: Option<f64>,

    /// Score rescaled to the min..max range; `None` when all scores are equal
    pub normalized_score: Option<f64>,
}

/// Rank competitors by descending score, then descending tie-breaker.
///
/// The output has one entry per input, at the same index. Entries whose score
/// and tie-breaker both equal those of the entry ranked just above share its
/// position; the next distinct entry continues at its own sorted index + 1
/// ("1, 1, 3").
///
/// Non-finite scores or tie-breakers count as 0.
pub fn rank(entries: &[RankInput]) -> Vec<RankedEntry> {
    let n = entries.len();
    if n == 0 {
        return Vec::new();
    }

    let entries: Vec<RankInput> = entries.iter().map(|e| e.sanitized()).collect();

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| compare_desc(&entries[a], &entries[b]));

    let mut positions = vec![0u32; n];
    for (sorted_index, &entry_index) in order.iter().enumerate() {
        positions[entry_index] = if sorted_index == 0 {
            1
        } else {
            let previous = order[sorted_index - 1];
            if is_tied(&entries[previous], &entries[entry_index]) {
                positions[previous]
            } else {
                sorted_index as u32 + 1
            }
        };
    }

    let last_position = positions.iter().copied().max().unwrap_or(1);
    let min_score = entries.iter().map(|e| e.score).fold(f64::INFINITY, f64::min);
    let max_score = entries
        .iter()
        .map(|e| e.score)
        .fold(f64::NEG_INFINITY, f64::max);

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let position = positions[index];
            RankedEntry {
                score: entry.score,
                tie_breaker: entry.tie_breaker,
                index,
                position,
                normalized_position: normalize_position(position, last_position),
                normalized_index: normalize_index(index, n),
                normalized_score: normalize_score(entry.score, min_score, max_score),
            }
        })
        .collect()
}

fn compare_desc(a: &RankInput, b: &RankInput) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.tie_breaker.total_cmp(&a.tie_breaker))
}

fn is_tied(a: &RankInput, b: &RankInput) -> bool {
    a.score == b.score && a.tie_breaker == b.tie_breaker
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn normalize_position(position: u32, last_position: u32) -> Option<f64> {
    if last_position < 2 {
        None
    } else {
        Some((position - 1) as f64 / (last_position - 1) as f64)
    }
}

fn normalize_index(index: usize, count: usize) -> Option<f64> {
    if count > 1 {
        Some(index as f64 / (count - 1) as f64)
    } else {
        None
    }
}

fn normalize_score(score: f64, min: f64, max: f64) -> Option<f64> {
    if max > min {
        Some((score - min) / (max - min))
    } else {
        None
    }
}
