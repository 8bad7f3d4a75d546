//! Sequential skill rating over a play history.
//!
//! Every play is a free-for-all ranked outcome. Participants are ordered by
//! finishing position and each one is compared only with its neighbours in
//! that order (Bradley-Terry partial pairing of the Weng-Lin update). Equal
//! positions count as half a win each way. Because the comparisons are
//! adjacent only, a player tied for first next to a tie partner collects no
//! credit for the players further down; reports are calibrated against this.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RatingConfig;
use crate::models::{Play, Player, PlayerId};

/// Mean skill estimate and its uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkillRating {
    pub mu: f64,
    pub sigma: f64,
}

impl SkillRating {
    pub fn new(mu: f64, sigma: f64) -> Self {
        Self { mu, sigma }
    }

    /// Prior rating of a player without history.
    pub fn prior(config: &RatingConfig) -> Self {
        Self::new(config.mu, config.sigma)
    }

    /// Skill `z` standard deviations below the mean.
    pub fn ordinal(&self, z: f64) -> f64 {
        self.mu - z * self.sigma
    }
}

/// A player's rating after replaying the full history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatedPlayer {
    pub player: Player,
    pub mu: f64,
    pub sigma: f64,

    /// Plays with at least two participants this player took part in
    pub play_count: u32,
}

impl RatedPlayer {
    /// Conservative skill estimate, `mu - 3 * sigma`.
    pub fn ordinal(&self) -> f64 {
        SkillRating::new(self.mu, self.sigma).ordinal(3.0)
    }
}

/// Replay `plays` in chronological order and rate every participant.
///
/// Plays are ordered by their `created` timestamp; the `date` misc field only
/// orders plays created at the same instant.
///
/// Plays with fewer than two players are ignored. Players with fewer than
/// `min_plays` qualifying plays are dropped from the result, which may leave
/// it empty; whether to retry with a lower threshold is up to the caller.
/// The result is sorted by descending `mu`.
pub fn calculate_ratings(plays: &[Play], min_plays: u32, config: &RatingConfig) -> Vec<RatedPlayer> {
    let mut eligible: Vec<&Play> = plays.iter().filter(|p| p.player_count() >= 2).collect();
    eligible.sort_by(|a, b| chronological(a, b));

    let play_counts = count_plays(&eligible);

    let mut ratings: HashMap<PlayerId, SkillRating> = HashMap::new();
    let mut players: HashMap<PlayerId, Player> = HashMap::new();
    for play in &eligible {
        for player in play.players() {
            players
                .entry(player.id.clone())
                .or_insert_with(|| player.clone());
        }
        rate_play(&mut ratings, play, config);
    }

    debug!(
        "Replayed {} of {} plays for {} players",
        eligible.len(),
        plays.len(),
        ratings.len()
    );

    let mut rated: Vec<RatedPlayer> = ratings
        .into_iter()
        .filter_map(|(id, rating)| {
            let play_count = play_counts.get(&id).copied().unwrap_or(0);
            if play_count < min_plays {
                return None;
            }
            let player = players.remove(&id)?;
            Some(RatedPlayer {
                player,
                mu: rating.mu,
                sigma: rating.sigma,
                play_count,
            })
        })
        .collect();

    rated.sort_by(|a, b| {
        b.mu.total_cmp(&a.mu)
            .then_with(|| a.player.id.cmp(&b.player.id))
    });
    rated
}

/// Order by creation time, then by the play date.
fn chronological(a: &Play, b: &Play) -> Ordering {
    a.created()
        .cmp(b.created())
        .then_with(|| a.date().cmp(&b.date()))
}

fn count_plays(plays: &[&Play]) -> HashMap<PlayerId, u32> {
    let mut counts = HashMap::new();
    for play in plays {
        for player in play.players() {
            *counts.entry(player.id.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// Apply one play's outcome to the running ratings.
fn rate_play(ratings: &mut HashMap<PlayerId, SkillRating>, play: &Play, config: &RatingConfig) {
    let mut standings: Vec<(PlayerId, u32, SkillRating)> = play
        .rankings()
        .iter()
        .map(|r| {
            let prior = ratings
                .get(&r.player.id)
                .copied()
                .unwrap_or_else(|| SkillRating::prior(config));
            (r.player.id.clone(), r.position, prior)
        })
        .collect();
    standings.sort_by_key(|(_, position, _)| *position);

    let positions: Vec<u32> = standings.iter().map(|(_, p, _)| *p).collect();
    let priors: Vec<SkillRating> = standings.iter().map(|(_, _, r)| *r).collect();
    let updated = update_partial_pairing(&priors, &positions, config);

    for ((id, _, _), rating) in standings.into_iter().zip(updated) {
        ratings.insert(id, rating);
    }
}

/// Weng-Lin update with Bradley-Terry comparisons between adjacent finishers.
///
/// `ratings` and `positions` are sorted by position, best first.
pub fn update_partial_pairing(
    ratings: &[SkillRating],
    positions: &[u32],
    config: &RatingConfig,
) -> Vec<SkillRating> {
    let tau_squared = config.tau * config.tau;
    let inflated: Vec<SkillRating> = ratings
        .iter()
        .map(|r| SkillRating::new(r.mu, (r.sigma * r.sigma + tau_squared).sqrt()))
        .collect();
    let beta_squared = config.beta * config.beta;

    inflated
        .iter()
        .enumerate()
        .map(|(i, current)| {
            let sigma_squared = current.sigma * current.sigma;
            let mut omega = 0.0;
            let mut delta = 0.0;

            let neighbours = [i.checked_sub(1), Some(i + 1)];
            for q in neighbours.into_iter().flatten().filter(|&q| q < inflated.len()) {
                let opponent = &inflated[q];
                let c = (sigma_squared + opponent.sigma * opponent.sigma + 2.0 * beta_squared).sqrt();
                let p = 1.0 / (1.0 + ((opponent.mu - current.mu) / c).exp());
                let sigma_squared_to_c = sigma_squared / c;

                omega += sigma_squared_to_c * (outcome(positions[i], positions[q]) - p);
                let gamma = sigma_squared.sqrt() / c;
                delta += (gamma * sigma_squared_to_c / c) * p * (1.0 - p);
            }

            let mut sigma = current.sigma * (1.0 - delta).max(config.kappa).sqrt();
            if config.limit_sigma {
                sigma = sigma.min(ratings[i].sigma);
            }
            SkillRating::new(current.mu + omega, sigma)
        })
        .collect()
}

/// Actual score of the player at `own` against the player at `other`.
fn outcome(own: u32, other: u32) -> f64 {
    match own.cmp(&other) {
        Ordering::Less => 1.0,
        Ordering::Equal => 0.5,
        Ordering::Greater => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlayRecord;

    fn approx_equal(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    fn play(id: &str, created: &str, results: &[(&str, f64)]) -> Play {
        let record = results.iter().fold(
            PlayRecord::new(id, "g1", created),
            |record, (player, score)| {
                record
                    .with_player(*player, player.to_uppercase())
                    .with_score(*player, "vp", *score)
            },
        );
        Play::new(record)
    }

    fn rating_of<'a>(rated: &'a [RatedPlayer], id: &str) -> &'a RatedPlayer {
        rated
            .iter()
            .find(|r| r.player.id.as_str() == id)
            .unwrap()
    }

    #[test]
    fn test_one_on_one_win() {
        let plays = vec![play("p1", "2024-01-01", &[("a", 10.0), ("b", 5.0)])];
        let rated = calculate_ratings(&plays, 0, &RatingConfig::default());

        assert_eq!(rated.len(), 2);
        assert_eq!(rated[0].player.id.as_str(), "a");
        assert!(approx_equal(rated[0].mu, 27.635389493140497, 1e-5));
        assert!(approx_equal(rated[0].sigma, 8.06590141354368, 1e-5));
        assert!(approx_equal(rated[1].mu, 22.364610506859503, 1e-5));
        assert!(approx_equal(rated[1].sigma, 8.06590141354368, 1e-5));
    }

    #[test]
    fn test_draw_keeps_means() {
        let plays = vec![play("p1", "2024-01-01", &[("a", 7.0), ("b", 7.0)])];
        let rated = calculate_ratings(&plays, 0, &RatingConfig::default());

        for player in &rated {
            assert!(approx_equal(player.mu, 25.0, 1e-9));
            assert!(player.sigma < 25.0 / 3.0);
        }
    }

    #[test]
    fn test_three_player_middle_compares_both_neighbours() {
        let plays = vec![play(
            "p1",
            "2024-01-01",
            &[("a", 3.0), ("b", 2.0), ("c", 1.0)],
        )];
        let rated = calculate_ratings(&plays, 0, &RatingConfig::default());

        assert!(approx_equal(rating_of(&rated, "a").mu, 27.635389493140497, 1e-5));
        assert!(approx_equal(rating_of(&rated, "b").mu, 25.0, 1e-9));
        assert!(approx_equal(rating_of(&rated, "b").sigma, 7.788847304776425, 1e-5));
        assert!(approx_equal(rating_of(&rated, "c").mu, 22.364610506859503, 1e-5));
    }

    #[test]
    fn test_shared_first_place_only_sees_neighbours() {
        let plays = vec![play(
            "p1",
            "2024-01-01",
            &[("a", 5.0), ("b", 5.0), ("c", 1.0)],
        )];
        let rated = calculate_ratings(&plays, 0, &RatingConfig::default());

        // "a" is only compared with its tie partner, so it gains nothing.
        assert!(approx_equal(rating_of(&rated, "a").mu, 25.0, 1e-9));
        assert!(approx_equal(rating_of(&rated, "b").mu, 27.635389493140497, 1e-5));
        assert!(approx_equal(rating_of(&rated, "c").mu, 22.364610506859503, 1e-5));
    }

    #[test]
    fn test_solo_plays_are_ignored() {
        let plays = vec![
            play("p1", "2024-01-01", &[("a", 10.0)]),
            play("p2", "2024-01-02", &[("a", 10.0), ("b", 5.0)]),
        ];
        let rated = calculate_ratings(&plays, 0, &RatingConfig::default());

        assert_eq!(rating_of(&rated, "a").play_count, 1);
        assert!(approx_equal(rating_of(&rated, "a").mu, 27.635389493140497, 1e-5));
    }

    #[test]
    fn test_min_plays_filter_may_empty_result() {
        let plays = vec![
            play("p1", "2024-01-01", &[("a", 10.0), ("b", 5.0)]),
            play("p2", "2024-01-02", &[("a", 1.0), ("b", 5.0)]),
        ];

        assert!(calculate_ratings(&plays, 5, &RatingConfig::default()).is_empty());
        assert_eq!(calculate_ratings(&plays, 2, &RatingConfig::default()).len(), 2);
    }

    #[test]
    fn test_min_plays_filter_keeps_regulars() {
        let plays = vec![
            play("p1", "2024-01-01", &[("a", 10.0), ("b", 5.0)]),
            play("p2", "2024-01-02", &[("a", 1.0), ("c", 5.0)]),
        ];
        let rated = calculate_ratings(&plays, 2, &RatingConfig::default());

        assert_eq!(rated.len(), 1);
        assert_eq!(rated[0].player.id.as_str(), "a");
        assert_eq!(rated[0].play_count, 2);
    }

    #[test]
    fn test_history_is_replayed_chronologically() {
        let first = play("p1", "2024-01-01", &[("a", 10.0), ("b", 5.0)]);
        let second = play("p2", "2024-02-01", &[("a", 1.0), ("b", 5.0)]);

        let forward = calculate_ratings(
            &[first.clone(), second.clone()],
            0,
            &RatingConfig::default(),
        );
        let shuffled = calculate_ratings(&[second, first], 0, &RatingConfig::default());

        assert_eq!(forward, shuffled);
        // The later result weighs more: "b" won last.
        assert_eq!(forward[0].player.id.as_str(), "b");
    }

    #[test]
    fn test_created_orders_before_play_date() {
        // Created first but dated last.
        let first = Play::new(
            PlayRecord::new("p1", "g1", "2024-01-01")
                .with_player("a", "A")
                .with_player("b", "B")
                .with_score("a", "vp", 10.0)
                .with_score("b", "vp", 5.0)
                .with_misc(crate::models::DATE_FIELD, "2024-06-01"),
        );
        let second = Play::new(
            PlayRecord::new("p2", "g1", "2024-02-01")
                .with_player("a", "A")
                .with_player("b", "B")
                .with_score("a", "vp", 1.0)
                .with_score("b", "vp", 5.0)
                .with_misc(crate::models::DATE_FIELD, "2023-01-01"),
        );

        let rated = calculate_ratings(&[second, first], 0, &RatingConfig::default());
        // "b" won the play created last, so it weighs more.
        assert_eq!(rated[0].player.id.as_str(), "b");
    }

    #[test]
    fn test_limit_sigma_never_increases() {
        let config = RatingConfig {
            limit_sigma: true,
            tau: 5.0,
            ..RatingConfig::default()
        };
        let priors = [SkillRating::new(25.0, 1.0), SkillRating::new(25.0, 1.0)];
        let updated = update_partial_pairing(&priors, &[1, 2], &config);

        assert!(updated.iter().all(|r| r.sigma <= 1.0));
    }

    #[test]
    fn test_empty_history() {
        assert!(calculate_ratings(&[], 0, &RatingConfig::default()).is_empty());
    }

    #[test]
    fn test_ordinal() {
        let rating = SkillRating::new(25.0, 25.0 / 3.0);
        assert!(approx_equal(rating.ordinal(3.0), 0.0, 1e-12));
    }
}
