//! Derived statistics models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{FieldId, PlayId, PlayerId};

/// A value and the play that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extremum {
    pub value: f64,
    pub play_id: PlayId,
}

/// Count, sum, average and extremes of a series of per-play values.
///
/// Extremes reached by several plays keep the smallest play ID, so the
/// summary does not depend on the order values arrive in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueSummary {
    pub count: u32,
    pub sum: f64,
    pub average: Option<f64>,
    pub min: Option<Extremum>,
    pub max: Option<Extremum>,
}

impl ValueSummary {
    /// Summary with one more value.
    pub fn with_value(self, value: f64, play_id: &PlayId) -> Self {
        let count = self.count + 1;
        let sum = self.sum + value;
        let candidate = Extremum {
            value,
            play_id: play_id.clone(),
        };

        Self {
            count,
            sum,
            average: Some(sum / count as f64),
            min: Some(pick(self.min, candidate.clone(), |new, old| new < old)),
            max: Some(pick(self.max, candidate, |new, old| new > old)),
        }
    }

    /// Summary with `value` added when present.
    pub fn with_optional(self, value: Option<f64>, play_id: &PlayId) -> Self {
        match value {
            Some(value) => self.with_value(value, play_id),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

fn pick(current: Option<Extremum>, candidate: Extremum, better: fn(f64, f64) -> bool) -> Extremum {
    match current {
        None => candidate,
        Some(current) => {
            let replaces = better(candidate.value, current.value)
                || (candidate.value == current.value && candidate.play_id < current.play_id);
            if replaces {
                candidate
            } else {
                current
            }
        }
    }
}

/// Aggregates for one game, over the plays with a given player count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStatistics {
    /// Player count of the bucket; `None` for all player counts combined
    pub player_count: Option<usize>,

    pub play_count: u32,

    /// Highest total of each play
    pub winning_score: ValueSummary,

    /// Duration in hours
    pub duration: ValueSummary,

    /// Duration in hours divided by player count
    pub duration_per_player: ValueSummary,

    /// Extra numeric misc dimensions, by field ID
    pub dimensions: BTreeMap<FieldId, ValueSummary>,
}

impl GameStatistics {
    /// Empty statistics for a bucket.
    pub fn new(player_count: Option<usize>, dimensions: &[FieldId]) -> Self {
        Self {
            player_count,
            play_count: 0,
            winning_score: ValueSummary::default(),
            duration: ValueSummary::default(),
            duration_per_player: ValueSummary::default(),
            dimensions: empty_dimensions(dimensions),
        }
    }

    /// True for the bucket covering every player count.
    pub fn is_overall(&self) -> bool {
        self.player_count.is_none()
    }
}

/// One player's aggregates for one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GamePlayerStatistics {
    pub player_id: PlayerId,
    pub play_count: u32,
    pub win_count: u32,

    /// Wins per play (0.0 to 1.0)
    pub win_rate: f64,

    /// Normalized position over plays where it is defined
    pub normalized_position: ValueSummary,

    /// The player's total in the plays they won
    pub winning_score: ValueSummary,

    /// Duration in hours of the plays the player took part in
    pub duration: ValueSummary,

    pub duration_per_player: ValueSummary,

    /// Extra numeric misc dimensions over the player's wins
    pub dimensions: BTreeMap<FieldId, ValueSummary>,
}

impl GamePlayerStatistics {
    /// Empty statistics for a player.
    pub fn new(player_id: PlayerId, dimensions: &[FieldId]) -> Self {
        Self {
            player_id,
            play_count: 0,
            win_count: 0,
            win_rate: 0.0,
            normalized_position: ValueSummary::default(),
            winning_score: ValueSummary::default(),
            duration: ValueSummary::default(),
            duration_per_player: ValueSummary::default(),
            dimensions: empty_dimensions(dimensions),
        }
    }

    /// Average normalized position, 0 = always first.
    pub fn average_normalized_position(&self) -> Option<f64> {
        self.normalized_position.average
    }
}

/// Usage of one value of a categorical dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionValueStatistics {
    pub value: String,

    /// Whether the value is one of the field's declared options
    pub declared: bool,

    /// Number of entries carrying the value
    pub use_count: u32,

    /// Number of distinct plays with the value
    pub play_count: u32,

    /// Uses by a player who finished first
    pub win_count: u32,

    /// Normalized position of the players using the value
    pub normalized_position: ValueSummary,
}

impl DimensionValueStatistics {
    /// Wins per use (0.0 to 1.0).
    pub fn win_rate(&self) -> f64 {
        crate::calculate::calculate_win_rate(self.win_count, self.use_count)
    }
}

/// Correlation between seat order and finishing position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartingOrderCorrelation {
    /// Over all plays; `None` when undefined
    pub overall: Option<f64>,
    pub sample_size: usize,

    /// By player count
    pub by_player_count: BTreeMap<usize, CorrelationSample>,
}

/// A correlation coefficient and the number of pairs behind it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationSample {
    pub coefficient: Option<f64>,
    pub sample_size: usize,
}

/// Aggregates for one scoring field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldStatistics {
    pub field_id: FieldId,
    pub name: String,

    /// Field score over every player appearance
    pub score: ValueSummary,

    /// Field score of the players who finished first
    pub winner_score: ValueSummary,

    /// Correlation of the field score with `1 - normalizedPosition`
    pub rank_correlation: Option<f64>,
}

fn empty_dimensions(dimensions: &[FieldId]) -> BTreeMap<FieldId, ValueSummary> {
    dimensions
        .iter()
        .map(|d| (d.clone(), ValueSummary::default()))
        .collect()
}
