//! Reports built on top of the core engines.

use std::collections::BTreeMap;

use tracing::{debug, info};

use super::correlation::correlation_or_none;
use super::plays_of;
use super::rating::{calculate_ratings, RatedPlayer};
use crate::config::RatingConfig;
use crate::models::{
    CorrelationSample, FieldStatistics, Game, Play, ScoreField, StartingOrderCorrelation,
    ValueSummary,
};

/// Rated players for a leaderboard.
///
/// If nobody reaches `min_plays`, the ratings are recomputed without the
/// threshold so the board is never empty while rated plays exist.
pub fn best_players(plays: &[Play], min_plays: u32, config: &RatingConfig) -> Vec<RatedPlayer> {
    let rated = calculate_ratings(plays, min_plays, config);
    if !rated.is_empty() || min_plays == 0 {
        return rated;
    }

    info!(
        "No player has {} rated plays, falling back to all players",
        min_plays
    );
    calculate_ratings(plays, 0, config)
}

/// Pairs of (normalized index, normalized position), by player count.
type SeatPairs = BTreeMap<usize, (Vec<f64>, Vec<f64>)>;

/// Correlation between seat order and finishing position.
///
/// Seat order is the order players are listed in a play. Games played with
/// simultaneous turns have no seat order and yield `None`. A positive
/// coefficient means later seats tend to finish worse.
pub fn starting_order_correlation(game: &Game, plays: &[Play]) -> Option<StartingOrderCorrelation> {
    if game.simultaneous_turns {
        debug!("Game {} has simultaneous turns, no starting order", game.id);
        return None;
    }

    let pairs = plays_of(game, plays).into_iter().fold(
        SeatPairs::new(),
        |mut pairs, play| {
            let (seats, positions) = pairs.entry(play.player_count()).or_default();
            for ranking in play.rankings() {
                if let (Some(seat), Some(position)) =
                    (ranking.normalized_index, ranking.normalized_position)
                {
                    seats.push(seat);
                    positions.push(position);
                }
            }
            pairs
        },
    );

    let (all_seats, all_positions): (Vec<f64>, Vec<f64>) = pairs
        .values()
        .flat_map(|(seats, positions)| seats.iter().copied().zip(positions.iter().copied()))
        .unzip();

    let by_player_count = pairs
        .iter()
        .filter(|(_, (seats, _))| !seats.is_empty())
        .map(|(&count, (seats, positions))| {
            let sample = CorrelationSample {
                coefficient: correlation_or_none(seats, positions),
                sample_size: seats.len(),
            };
            (count, sample)
        })
        .collect();

    Some(StartingOrderCorrelation {
        overall: correlation_or_none(&all_seats, &all_positions),
        sample_size: all_seats.len(),
        by_player_count,
    })
}

/// Statistics for every scoring field of `game`, in declaration order.
///
/// Scores are taken per player appearance; a player without entries for a
/// field scores 0 in it. The rank correlation relates the field score to
/// `1 - normalizedPosition`, so fields that drive wins correlate positively.
pub fn field_statistics(game: &Game, plays: &[Play]) -> Vec<FieldStatistics> {
    let plays = plays_of(game, plays);
    game.score_fields
        .iter()
        .map(|field| field_summary(field, &plays))
        .collect()
}

fn field_summary(field: &ScoreField, plays: &[&Play]) -> FieldStatistics {
    let initial = (ValueSummary::default(), ValueSummary::default(), Vec::new());

    let (score, winner_score, pairs) =
        plays
            .iter()
            .fold(initial, |(mut score, mut winner_score, mut pairs), play| {
                for ranking in play.rankings() {
                    let value = play.field_score(ranking.player.id.as_str(), field.id.as_str());
                    score = score.with_value(value, play.id());
                    if ranking.is_winner() {
                        winner_score = winner_score.with_value(value, play.id());
                    }
                    if let Some(position) = ranking.normalized_position {
                        pairs.push((value, 1.0 - position));
                    }
                }
                (score, winner_score, pairs)
            });

    let (values, strengths): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();

    FieldStatistics {
        field_id: field.id.clone(),
        name: field.name.clone(),
        score,
        winner_score,
        rank_correlation: correlation_or_none(&values, &strengths),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlayRecord;
    use pretty_assertions::assert_eq;

    fn head_to_head(id: &str, created: &str, winner: &str, loser: &str) -> Play {
        Play::new(
            PlayRecord::new(id, "g1", created)
                .with_player(winner, winner.to_uppercase())
                .with_player(loser, loser.to_uppercase())
                .with_score(winner, "vp", 10.0)
                .with_score(loser, "vp", 5.0),
        )
    }

    #[test]
    fn test_best_players_retries_without_threshold() {
        let plays = vec![
            head_to_head("p1", "2024-01-01", "a", "b"),
            head_to_head("p2", "2024-01-02", "a", "b"),
        ];
        let config = RatingConfig::default();

        assert!(calculate_ratings(&plays, 5, &config).is_empty());

        let best = best_players(&plays, 5, &config);
        assert_eq!(best.len(), 2);
        assert_eq!(best[0].player.id.as_str(), "a");
        assert_eq!(best[0].play_count, 2);
    }

    #[test]
    fn test_best_players_keeps_threshold_when_met() {
        let plays = vec![
            head_to_head("p1", "2024-01-01", "a", "b"),
            head_to_head("p2", "2024-01-02", "a", "c"),
        ];

        let best = best_players(&plays, 2, &RatingConfig::default());
        assert_eq!(best.len(), 1);
        assert_eq!(best[0].player.id.as_str(), "a");
    }

    #[test]
    fn test_best_players_without_rated_plays() {
        assert!(best_players(&[], 3, &RatingConfig::default()).is_empty());
    }

    fn seated_play(id: &str, scores: &[f64]) -> Play {
        let record = scores.iter().enumerate().fold(
            PlayRecord::new(id, "g1", "2024-01-01"),
            |record, (seat, &score)| {
                let player = format!("s{}", seat);
                record
                    .with_player(player.as_str(), player.as_str())
                    .with_score(player.as_str(), "vp", score)
            },
        );
        Play::new(record)
    }

    #[test]
    fn test_starting_order_correlation_first_seat_advantage() {
        let game = Game::new("g1", "Catan");
        let plays = vec![
            seated_play("p1", &[10.0, 8.0, 6.0]),
            seated_play("p2", &[9.0, 7.0, 5.0]),
            seated_play("p3", &[12.0, 4.0]),
        ];

        let result = starting_order_correlation(&game, &plays).unwrap();
        assert_eq!(result.sample_size, 8);
        assert!((result.overall.unwrap() - 1.0).abs() < 1e-12);

        assert_eq!(result.by_player_count[&3].sample_size, 6);
        assert!((result.by_player_count[&3].coefficient.unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(result.by_player_count[&2].sample_size, 2);
        assert!((result.by_player_count[&2].coefficient.unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_starting_order_correlation_skips_ties_and_simultaneous_games() {
        let game = Game::new("g1", "Catan");
        let plays = vec![seated_play("p1", &[5.0, 5.0])];

        let result = starting_order_correlation(&game, &plays).unwrap();
        assert_eq!(result.sample_size, 0);
        assert_eq!(result.overall, None);
        assert!(result.by_player_count.is_empty());

        let simultaneous = Game::new("g1", "Race").with_simultaneous_turns();
        assert_eq!(starting_order_correlation(&simultaneous, &plays), None);
    }

    #[test]
    fn test_field_statistics() {
        let game = Game::new("g1", "Catan")
            .with_score_field("vp", "Victory points")
            .with_score_field("roads", "Roads");
        let plays = vec![
            Play::new(
                PlayRecord::new("p1", "g1", "2024-01-01")
                    .with_player("a", "A")
                    .with_player("b", "B")
                    .with_score("a", "vp", 8.0)
                    .with_score("a", "roads", 2.0)
                    .with_score("b", "vp", 6.0),
            ),
            Play::new(
                PlayRecord::new("p2", "g1", "2024-01-02")
                    .with_player("a", "A")
                    .with_player("b", "B")
                    .with_score("a", "vp", 4.0)
                    .with_score("b", "vp", 9.0)
                    .with_score("b", "roads", 2.0),
            ),
        ];

        let stats = field_statistics(&game, &plays);
        assert_eq!(
            stats.iter().map(|s| s.field_id.as_str()).collect::<Vec<_>>(),
            vec!["vp", "roads"]
        );

        let vp = &stats[0];
        assert_eq!(vp.name, "Victory points");
        assert_eq!(vp.score.count, 4);
        assert_eq!(vp.score.average, Some(6.75));
        assert_eq!(vp.winner_score.average, Some(8.5));
        assert_eq!(vp.score.max.as_ref().unwrap().play_id.as_str(), "p2");
        assert!(vp.rank_correlation.unwrap() > 0.8);

        let roads = &stats[1];
        assert_eq!(roads.winner_score.average, Some(2.0));
        assert!((roads.rank_correlation.unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_field_statistics_order_independent() {
        let game = Game::new("g1", "Catan").with_score_field("vp", "Victory points");
        let plays = vec![
            seated_play("p1", &[10.0, 8.5, 6.0]),
            seated_play("p2", &[9.0, 7.25, 5.0]),
            seated_play("p3", &[12.0, 4.0]),
        ];
        let mut reversed = plays.clone();
        reversed.reverse();

        assert_eq!(
            field_statistics(&game, &plays),
            field_statistics(&game, &reversed)
        );
    }
}
