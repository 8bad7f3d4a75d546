//! Usage statistics for the values of a categorical misc field.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::models::{DimensionValueStatistics, MiscEntry, MiscField, Play, PlayId, ValueSummary};

#[derive(Debug, Clone)]
struct ValueAccumulator {
    stats: DimensionValueStatistics,
    plays: BTreeSet<PlayId>,
}

impl ValueAccumulator {
    fn new(value: &str, declared: bool) -> Self {
        Self {
            stats: DimensionValueStatistics {
                value: value.to_string(),
                declared,
                use_count: 0,
                play_count: 0,
                win_count: 0,
                normalized_position: ValueSummary::default(),
            },
            plays: BTreeSet::new(),
        }
    }

    fn finish(self) -> DimensionValueStatistics {
        DimensionValueStatistics {
            play_count: self.plays.len() as u32,
            ..self.stats
        }
    }
}

type Accumulators = BTreeMap<String, ValueAccumulator>;

/// Count how each value of `dimension` is used across `plays`.
///
/// Every declared option gets an entry, used or not; values found in the
/// data but not declared are added as they appear. With `player_id`, only
/// entries tagged with that player are considered.
///
/// Wins and normalized positions come from the player an entry is tagged
/// with; play-wide entries only count as uses. An entry tagged with a player
/// missing from the play's rankings is logged and counted as a use only.
pub fn dimension_statistics(
    plays: &[Play],
    dimension: &MiscField,
    player_id: Option<&str>,
) -> BTreeMap<String, DimensionValueStatistics> {
    let initial: Accumulators = dimension
        .options()
        .iter()
        .map(|option| (option.clone(), ValueAccumulator::new(option, true)))
        .collect();

    let mut ordered: Vec<&Play> = plays.iter().collect();
    ordered.sort_by(|a, b| a.id().cmp(b.id()));

    ordered
        .into_iter()
        .fold(initial, |accumulators, play| {
            add_play(accumulators, play, dimension, player_id)
        })
        .into_iter()
        .map(|(value, accumulator)| (value, accumulator.finish()))
        .collect()
}

fn add_play(
    accumulators: Accumulators,
    play: &Play,
    dimension: &MiscField,
    player_id: Option<&str>,
) -> Accumulators {
    play.misc_entries(dimension.id.as_str())
        .filter(|entry| match player_id {
            Some(player_id) => entry.player_id.as_ref().map(|p| p.as_str()) == Some(player_id),
            None => true,
        })
        .fold(accumulators, |accumulators, entry| {
            add_entry(accumulators, play, entry)
        })
}

fn add_entry(mut accumulators: Accumulators, play: &Play, entry: &MiscEntry) -> Accumulators {
    let ranking = entry.player_id.as_ref().and_then(|player_id| {
        let ranking = play
            .rankings()
            .iter()
            .find(|r| &r.player.id == player_id);
        if ranking.is_none() {
            warn!(
                "Play {}: {} entry references player {} who is not ranked",
                play.id(),
                entry.field_id,
                player_id
            );
        }
        ranking
    });

    for value in entry.data.values().into_iter().filter(|v| !v.is_empty()) {
        let accumulator = accumulators
            .remove(value)
            .unwrap_or_else(|| ValueAccumulator::new(value, false));

        let mut plays = accumulator.plays;
        plays.insert(play.id().clone());

        let stats = accumulator.stats;
        let stats = DimensionValueStatistics {
            use_count: stats.use_count + 1,
            win_count: stats.win_count + u32::from(ranking.is_some_and(|r| r.is_winner())),
            normalized_position: stats.normalized_position.with_optional(
                ranking.and_then(|r| r.normalized_position),
                play.id(),
            ),
            ..stats
        };

        accumulators.insert(value.to_string(), ValueAccumulator { stats, plays });
    }
    accumulators
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlayRecord;
    use pretty_assertions::assert_eq;

    fn faction() -> MiscField {
        MiscField::text("faction", "Faction")
            .with_options(["red", "blue", "green"])
            .per_player()
            .report_dimension()
    }

    fn plays() -> Vec<Play> {
        vec![
            Play::new(
                PlayRecord::new("p1", "g1", "2024-01-01")
                    .with_player("a", "A")
                    .with_player("b", "B")
                    .with_score("a", "vp", 10.0)
                    .with_score("b", "vp", 5.0)
                    .with_player_misc("a", "faction", "blue")
                    .with_player_misc("b", "faction", "purple"),
            ),
            Play::new(
                PlayRecord::new("p2", "g1", "2024-01-02")
                    .with_player("a", "A")
                    .with_player("b", "B")
                    .with_player("c", "C")
                    .with_score("a", "vp", 1.0)
                    .with_score("b", "vp", 9.0)
                    .with_score("c", "vp", 5.0)
                    .with_player_misc("a", "faction", "blue")
                    .with_player_misc("b", "faction", "blue")
                    .with_player_misc("c", "faction", "green"),
            ),
        ]
    }

    #[test]
    fn test_zero_use_option_is_reported() {
        let stats = dimension_statistics(&plays(), &faction(), None);

        let red = &stats["red"];
        assert_eq!(red.use_count, 0);
        assert_eq!(red.play_count, 0);
        assert!(red.declared);
    }

    #[test]
    fn test_value_counts() {
        let stats = dimension_statistics(&plays(), &faction(), None);

        let blue = &stats["blue"];
        assert_eq!(blue.use_count, 3);
        assert_eq!(blue.play_count, 2);
        assert_eq!(blue.win_count, 2);
        // p1 a: 0.0, p2 a: 1.0, p2 b: 0.0
        assert_eq!(blue.normalized_position.count, 3);
        assert!((blue.normalized_position.average.unwrap() - 1.0 / 3.0).abs() < 1e-12);

        let green = &stats["green"];
        assert_eq!(green.use_count, 1);
        assert_eq!(green.win_count, 0);
        assert_eq!(green.normalized_position.average, Some(0.5));
    }

    #[test]
    fn test_ad_hoc_values_are_discovered() {
        let stats = dimension_statistics(&plays(), &faction(), None);

        let purple = &stats["purple"];
        assert!(!purple.declared);
        assert_eq!(purple.use_count, 1);
        assert_eq!(
            stats.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["blue", "green", "purple", "red"]
        );
    }

    #[test]
    fn test_player_filter() {
        let stats = dimension_statistics(&plays(), &faction(), Some("b"));

        assert_eq!(stats["blue"].use_count, 1);
        assert_eq!(stats["blue"].win_count, 1);
        assert_eq!(stats["purple"].use_count, 1);
        assert_eq!(stats["green"].use_count, 0);
    }

    #[test]
    fn test_play_wide_and_list_values() {
        let map = MiscField::text("map", "Map");
        let plays = vec![Play::new(
            PlayRecord::new("p1", "g1", "2024-01-01")
                .with_player("a", "A")
                .with_misc("map", vec!["desert", "coast", ""]),
        )];

        let stats = dimension_statistics(&plays, &map, None);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats["desert"].use_count, 1);
        assert_eq!(stats["coast"].win_count, 0);
        assert!(stats["coast"].normalized_position.is_empty());

        assert!(dimension_statistics(&plays, &map, Some("a")).is_empty());
    }

    #[test]
    fn test_unranked_player_counts_as_use_only() {
        let plays = vec![Play::new(
            PlayRecord::new("p1", "g1", "2024-01-01")
                .with_player("a", "A")
                .with_player_misc("ghost", "faction", "red"),
        )];

        let stats = dimension_statistics(&plays, &faction(), None);
        assert_eq!(stats["red"].use_count, 1);
        assert_eq!(stats["red"].win_count, 0);
    }

    #[test]
    fn test_order_independent() {
        let mut reversed = plays();
        reversed.reverse();

        assert_eq!(
            dimension_statistics(&plays(), &faction(), None),
            dimension_statistics(&reversed, &faction(), None)
        );
    }
}
