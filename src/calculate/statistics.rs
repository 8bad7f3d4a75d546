//! Game and player aggregates.
//!
//! Both entry points fold the plays into owned accumulators, one play per
//! step. Every step only adds counts and sums or keeps extremes, so the
//! result does not depend on the order of the input.

use std::collections::BTreeMap;

use tracing::debug;

use super::{calculate_win_rate, plays_of};
use crate::models::{FieldId, Game, GamePlayerStatistics, GameStatistics, Play, ValueSummary};

type Buckets = BTreeMap<Option<usize>, GameStatistics>;

/// Aggregate the plays of `game`, bucketed by player count.
///
/// The first entry covers every player count; the rest follow in ascending
/// player count. `extra_numeric_dimensions` names numeric misc fields whose
/// play-wide values are summarised per bucket.
pub fn game_statistics(
    game: &Game,
    plays: &[Play],
    extra_numeric_dimensions: &[FieldId],
) -> Vec<GameStatistics> {
    let mut initial = Buckets::new();
    initial.insert(None, GameStatistics::new(None, extra_numeric_dimensions));

    let buckets = plays_of(game, plays).into_iter().fold(initial, |buckets, play| {
        add_to_buckets(buckets, play, extra_numeric_dimensions)
    });

    debug!(
        "Aggregated game {} into {} player count buckets",
        game.id,
        buckets.len() - 1
    );
    buckets.into_values().collect()
}

fn add_to_buckets(mut buckets: Buckets, play: &Play, dimensions: &[FieldId]) -> Buckets {
    for key in [None, Some(play.player_count())] {
        let stats = buckets
            .remove(&key)
            .unwrap_or_else(|| GameStatistics::new(key, dimensions));
        buckets.insert(key, add_play(stats, play));
    }
    buckets
}

fn add_play(stats: GameStatistics, play: &Play) -> GameStatistics {
    let id = play.id();
    let duration = play.duration_in_hours();

    GameStatistics {
        player_count: stats.player_count,
        play_count: stats.play_count + 1,
        winning_score: stats
            .winning_score
            .with_optional(play.winner_score().map(|s| s as f64), id),
        duration: stats.duration.with_optional(duration, id),
        duration_per_player: stats
            .duration_per_player
            .with_optional(per_player(duration, play), id),
        dimensions: add_dimensions(stats.dimensions, play, None),
    }
}

/// Aggregate one player's plays of `game`.
///
/// Plays without the player are ignored. Winning scores and extra dimensions
/// are only taken from the plays the player won; per-player dimension
/// values take precedence over play-wide ones.
pub fn game_player_statistics(
    game: &Game,
    plays: &[Play],
    player_id: &str,
    extra_numeric_dimensions: &[FieldId],
) -> GamePlayerStatistics {
    let initial = GamePlayerStatistics::new(player_id.into(), extra_numeric_dimensions);

    plays_of(game, plays).into_iter().fold(initial, |stats, play| {
        add_player_play(stats, play, player_id)
    })
}

fn add_player_play(stats: GamePlayerStatistics, play: &Play, player_id: &str) -> GamePlayerStatistics {
    let Ok(ranking) = play.ranking(player_id) else {
        return stats;
    };

    let id = play.id();
    let won = ranking.is_winner();
    let duration = play.duration_in_hours();
    let play_count = stats.play_count + 1;
    let win_count = stats.win_count + u32::from(won);

    GamePlayerStatistics {
        player_id: stats.player_id,
        play_count,
        win_count,
        win_rate: calculate_win_rate(win_count, play_count),
        normalized_position: stats
            .normalized_position
            .with_optional(ranking.normalized_position, id),
        winning_score: stats
            .winning_score
            .with_optional(won.then_some(ranking.score as f64), id),
        duration: stats.duration.with_optional(duration, id),
        duration_per_player: stats
            .duration_per_player
            .with_optional(per_player(duration, play), id),
        dimensions: if won {
            add_dimensions(stats.dimensions, play, Some(player_id))
        } else {
            stats.dimensions
        },
    }
}

fn per_player(duration: Option<f64>, play: &Play) -> Option<f64> {
    let players = play.player_count();
    duration.filter(|_| players > 0).map(|d| d / players as f64)
}

fn add_dimensions(
    dimensions: BTreeMap<FieldId, ValueSummary>,
    play: &Play,
    player_id: Option<&str>,
) -> BTreeMap<FieldId, ValueSummary> {
    dimensions
        .into_iter()
        .map(|(field, summary)| {
            let value = play.misc_number(field.as_str(), player_id);
            let summary = summary.with_optional(value, play.id());
            (field, summary)
        })
        .collect()
}
