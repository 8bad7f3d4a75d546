//! Statistics calculation engine.
//!
//! Pure computations over plays the caller has already fetched:
//! - Tie-aware rankings within a play
//! - Skill ratings over the chronological play history
//! - Correlation between numeric series
//! - Per game, per player and per dimension aggregates
//! - Supplementary reports (best players, starting order, scoring fields)

pub mod correlation;
pub mod dimensions;
pub mod ranking;
pub mod rating;
pub mod reports;
pub mod statistics;

pub use correlation::{
    correlation, correlation_or_none, describe_correlation, format_correlation, CorrelationStrength,
};
pub use dimensions::dimension_statistics;
pub use ranking::{rank, RankInput, RankedEntry};
pub use rating::{calculate_ratings, RatedPlayer, SkillRating};
pub use reports::{best_players, field_statistics, starting_order_correlation};
pub use statistics::{game_player_statistics, game_statistics};

use tracing::warn;

use crate::models::{Game, Play};

/// Calculate win rate from wins and plays.
pub fn calculate_win_rate(wins: u32, plays: u32) -> f64 {
    if plays == 0 {
        0.0
    } else {
        wins as f64 / plays as f64
    }
}

/// Plays belonging to `game`, in ID order.
///
/// Plays of other games are skipped with a warning. The fixed order keeps
/// floating point sums independent of the input order.
pub(crate) fn plays_of<'a>(game: &Game, plays: &'a [Play]) -> Vec<&'a Play> {
    let mut selected: Vec<&Play> = plays
        .iter()
        .filter(|play| {
            let matches = play.game_id() == &game.id;
            if !matches {
                warn!(
                    "Skipping play {} of game {} while aggregating game {}",
                    play.id(),
                    play.game_id(),
                    game.id
                );
            }
            matches
        })
        .collect();
    selected.sort_by(|a, b| a.id().cmp(b.id()));
    selected
}
