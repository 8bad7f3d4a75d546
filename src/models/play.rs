//! Play records and the derived play model.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::{FieldId, GameId, PlayId, PlayerId};
use crate::calculate::ranking::{rank, RankInput};
use crate::parse_duration_hours;

/// Misc field holding the play date (`YYYY-MM-DD` or RFC 3339).
pub const DATE_FIELD: &str = "date";
/// Misc field holding the play duration.
pub const DURATION_FIELD: &str = "duration";
/// Misc field holding a free-text play name.
pub const NAME_FIELD: &str = "name";
/// Misc field holding the play location.
pub const LOCATION_FIELD: &str = "location";

/// Errors raised by play lookups.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlayError {
    #[error("Player not in play: {0}")]
    PlayerNotInPlay(PlayerId),
}

/// A participant. Identity is the ID; names may collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One score contribution of a player to a scoring field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntry {
    pub player_id: PlayerId,
    pub field_id: FieldId,
    #[serde(default)]
    pub score: f64,
}

/// Value of a misc entry: a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MiscData {
    Single(String),
    List(Vec<String>),
}

impl MiscData {
    /// All contained values.
    pub fn values(&self) -> Vec<&str> {
        match self {
            MiscData::Single(value) => vec![value.as_str()],
            MiscData::List(values) => values.iter().map(String::as_str).collect(),
        }
    }

    /// First contained value, if any.
    pub fn first(&self) -> Option<&str> {
        match self {
            MiscData::Single(value) => Some(value),
            MiscData::List(values) => values.first().map(String::as_str),
        }
    }

    /// True if the data equals `value` or, for lists, contains it.
    pub fn contains(&self, value: &str) -> bool {
        match self {
            MiscData::Single(v) => v == value,
            MiscData::List(values) => values.iter().any(|v| v == value),
        }
    }
}

impl From<&str> for MiscData {
    fn from(value: &str) -> Self {
        MiscData::Single(value.to_string())
    }
}

impl From<Vec<&str>> for MiscData {
    fn from(values: Vec<&str>) -> Self {
        MiscData::List(values.into_iter().map(str::to_string).collect())
    }
}

/// A non-scoring attribute. Without `player_id` it applies to the whole play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiscEntry {
    pub field_id: FieldId,
    pub data: MiscData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<PlayerId>,
}

/// One session of a game, as fetched from the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayRecord {
    pub id: PlayId,
    pub game_id: GameId,

    #[serde(default)]
    pub players: Vec<Player>,

    #[serde(default)]
    pub scores: Vec<ScoreEntry>,

    #[serde(default)]
    pub misc: Vec<MiscEntry>,

    #[serde(default)]
    pub expansions: Vec<String>,

    /// Sortable creation timestamp (ISO 8601)
    pub created: String,
}

impl PlayRecord {
    /// Create an empty record.
    pub fn new(
        id: impl Into<PlayId>,
        game_id: impl Into<GameId>,
        created: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            game_id: game_id.into(),
            players: Vec::new(),
            scores: Vec::new(),
            misc: Vec::new(),
            expansions: Vec::new(),
            created: created.into(),
        }
    }

    /// Builder method to add a player.
    pub fn with_player(mut self, id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        self.players.push(Player::new(id, name));
        self
    }

    /// Builder method to add a score entry.
    pub fn with_score(
        mut self,
        player_id: impl Into<PlayerId>,
        field_id: impl Into<FieldId>,
        score: f64,
    ) -> Self {
        self.scores.push(ScoreEntry {
            player_id: player_id.into(),
            field_id: field_id.into(),
            score,
        });
        self
    }

    /// Builder method to add a play-wide misc entry.
    pub fn with_misc(mut self, field_id: impl Into<FieldId>, data: impl Into<MiscData>) -> Self {
        self.misc.push(MiscEntry {
            field_id: field_id.into(),
            data: data.into(),
            player_id: None,
        });
        self
    }

    /// Builder method to add a per-player misc entry.
    pub fn with_player_misc(
        mut self,
        player_id: impl Into<PlayerId>,
        field_id: impl Into<FieldId>,
        data: impl Into<MiscData>,
    ) -> Self {
        self.misc.push(MiscEntry {
            field_id: field_id.into(),
            data: data.into(),
            player_id: Some(player_id.into()),
        });
        self
    }

    /// Sum of a player's score entries before flooring.
    ///
    /// The result does not depend on the order of the entries.
    pub fn raw_total(&self, player_id: &str) -> f64 {
        canonical_sum(
            self.scores
                .iter()
                .filter(|s| s.player_id.as_str() == player_id)
                .map(|s| s.score),
        )
    }
}

/// Scores are summed to six decimal places.
const SCORE_SCALE: f64 = 1e6;

/// Add scores in ascending order and round to [`SCORE_SCALE`].
fn canonical_sum(scores: impl Iterator<Item = f64>) -> f64 {
    let mut scores: Vec<f64> = scores.collect();
    scores.sort_by(f64::total_cmp);
    round_score(scores.iter().sum())
}

fn round_score(value: f64) -> f64 {
    (value * SCORE_SCALE).round() / SCORE_SCALE
}

/// Rank data of one player in one play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranking {
    pub player: Player,

    /// Displayed total (floored)
    pub score: i64,

    /// Fractional remainder of the raw total
    pub tie_breaker: f64,

    pub index: usize,
    pub position: u32,
    pub normalized_position: Option<f64>,
    pub normalized_index: Option<f64>,
    pub normalized_score: Option<f64>,
}

impl Ranking {
    pub fn is_winner(&self) -> bool {
        self.position == 1
    }
}

/// Compute the rankings of a play, in `players` order.
///
/// The floored total is the score; the fractional remainder breaks ties.
pub fn derive_rankings(record: &PlayRecord) -> Vec<Ranking> {
    let inputs: Vec<RankInput> = record
        .players
        .iter()
        .map(|p| {
            let raw = record.raw_total(p.id.as_str());
            let total = raw.floor();
            RankInput::new(total).with_tie_breaker(round_score(raw - total))
        })
        .collect();

    rank(&inputs)
        .into_iter()
        .zip(record.players.iter())
        .map(|(ranked, player)| Ranking {
            player: player.clone(),
            score: ranked.score as i64,
            tie_breaker: ranked.tie_breaker,
            index: ranked.index,
            position: ranked.position,
            normalized_position: ranked.normalized_position,
            normalized_index: ranked.normalized_index,
            normalized_score: ranked.normalized_score,
        })
        .collect()
}

/// Sentinel date for undated plays, sorting before every real date.
pub fn undated() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Parse a play date: `YYYY-MM-DD`, RFC 3339, or a string starting with a date.
pub fn parse_play_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Some(datetime.date_naive());
    }
    value
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

/// A play record together with its rankings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Play {
    record: PlayRecord,
    rankings: Vec<Ranking>,
}

impl Play {
    /// Wrap a record, deriving its rankings once.
    pub fn new(record: PlayRecord) -> Self {
        warn_on_unknown_players(&record);
        let rankings = derive_rankings(&record);
        Self { record, rankings }
    }

    /// Wrap a record with rankings the caller already derived.
    pub fn with_rankings(record: PlayRecord, rankings: Vec<Ranking>) -> Self {
        Self { record, rankings }
    }

    pub fn record(&self) -> &PlayRecord {
        &self.record
    }

    pub fn into_record(self) -> PlayRecord {
        self.record
    }

    pub fn id(&self) -> &PlayId {
        &self.record.id
    }

    pub fn game_id(&self) -> &GameId {
        &self.record.game_id
    }

    pub fn players(&self) -> &[Player] {
        &self.record.players
    }

    pub fn player_count(&self) -> usize {
        self.record.players.len()
    }

    pub fn rankings(&self) -> &[Ranking] {
        &self.rankings
    }

    pub fn created(&self) -> &str {
        &self.record.created
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.record.players.iter().any(|p| p.id.as_str() == player_id)
    }

    /// Sum of a player's score entries, floored.
    ///
    /// Fractional tie-breaker components never reach the displayed total.
    pub fn total(&self, player_id: &str) -> i64 {
        self.record.raw_total(player_id).floor() as i64
    }

    /// Sum of a player's entries for one scoring field.
    pub fn field_score(&self, player_id: &str, field_id: &str) -> f64 {
        canonical_sum(
            self.record
                .scores
                .iter()
                .filter(|s| s.player_id.as_str() == player_id && s.field_id.as_str() == field_id)
                .map(|s| s.score),
        )
    }

    /// Rank position of a player.
    ///
    /// Returns `None` for a player outside the play. That only happens with
    /// inconsistent data, so callers must guard; see [`Play::ranking`] for the
    /// failing variant.
    pub fn position(&self, player_id: &str) -> Option<u32> {
        self.find_ranking(player_id).map(|r| r.position)
    }

    /// Ranking of a player.
    ///
    /// Unlike [`Play::position`], an unknown player is an error: asking for
    /// the full ranking of someone who did not play is a caller bug.
    pub fn ranking(&self, player_id: &str) -> Result<&Ranking, PlayError> {
        self.find_ranking(player_id)
            .ok_or_else(|| PlayError::PlayerNotInPlay(PlayerId::from(player_id)))
    }

    fn find_ranking(&self, player_id: &str) -> Option<&Ranking> {
        self.rankings
            .iter()
            .find(|r| r.player.id.as_str() == player_id)
    }

    pub fn is_winner(&self, player_id: &str) -> bool {
        self.position(player_id) == Some(1)
    }

    /// Rankings of the players in position 1.
    pub fn winners(&self) -> impl Iterator<Item = &Ranking> {
        self.rankings.iter().filter(|r| r.is_winner())
    }

    /// Highest total in the play, `None` without players.
    pub fn winner_score(&self) -> Option<i64> {
        self.record
            .players
            .iter()
            .map(|p| self.total(p.id.as_str()))
            .max()
    }

    /// Misc entries of one field, for any player.
    pub fn misc_entries<'a>(&'a self, field_id: &'a str) -> impl Iterator<Item = &'a MiscEntry> {
        self.record
            .misc
            .iter()
            .filter(move |m| m.field_id.as_str() == field_id)
    }

    /// Misc value for a field, either play-wide (`None`) or for one player.
    pub fn misc_value(&self, field_id: &str, player_id: Option<&str>) -> Option<&MiscData> {
        self.record
            .misc
            .iter()
            .find(|m| {
                m.field_id.as_str() == field_id
                    && m.player_id.as_ref().map(|p| p.as_str()) == player_id
            })
            .map(|m| &m.data)
    }

    /// First play-wide text value of a field.
    pub fn misc_text(&self, field_id: &str) -> Option<&str> {
        self.misc_value(field_id, None).and_then(MiscData::first)
    }

    /// Numeric value of a field.
    ///
    /// With a player, that player's value wins over the play-wide one.
    pub fn misc_number(&self, field_id: &str, player_id: Option<&str>) -> Option<f64> {
        let data = player_id
            .and_then(|p| self.misc_value(field_id, Some(p)))
            .or_else(|| self.misc_value(field_id, None))?;
        let raw = data.first()?.trim();
        if raw.is_empty() {
            return None;
        }
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Some(value),
            _ => {
                warn!(
                    "Play {}: value {:?} of field {} is not a number",
                    self.record.id, raw, field_id
                );
                None
            }
        }
    }

    /// True if any entry of the field, for any player, equals or contains `value`.
    pub fn has_misc_field_value(&self, field_id: &str, value: &str) -> bool {
        self.misc_entries(field_id).any(|m| m.data.contains(value))
    }

    /// Parsed `date` field, if set and valid.
    pub fn dated(&self) -> Option<NaiveDate> {
        self.misc_text(DATE_FIELD).and_then(parse_play_date)
    }

    /// Play date, or the far-past [`undated`] sentinel so undated plays sort first.
    pub fn date(&self) -> NaiveDate {
        self.dated().unwrap_or_else(undated)
    }

    /// Display label from date and name (or location), falling back to the game ID.
    pub fn name(&self) -> String {
        let label = [NAME_FIELD, LOCATION_FIELD]
            .iter()
            .filter_map(|field| self.misc_text(field))
            .map(str::trim)
            .find(|text| !text.is_empty());

        match (self.dated(), label) {
            (Some(date), Some(label)) => format!("{} - {}", date, label),
            (Some(date), None) => date.to_string(),
            (None, Some(label)) => label.to_string(),
            (None, None) => self.record.game_id.to_string(),
        }
    }

    /// Duration in hours, `None` if unset or unparsable.
    pub fn duration_in_hours(&self) -> Option<f64> {
        self.misc_text(DURATION_FIELD).and_then(parse_duration_hours)
    }
}

fn warn_on_unknown_players(record: &PlayRecord) {
    let known = |id: &PlayerId| record.players.iter().any(|p| &p.id == id);

    for score in record.scores.iter().filter(|s| !known(&s.player_id)) {
        warn!(
            "Play {}: score for field {} references unknown player {}",
            record.id, score.field_id, score.player_id
        );
    }
    for misc in &record.misc {
        if let Some(player_id) = misc.player_id.as_ref().filter(|p| !known(p)) {
            warn!(
                "Play {}: misc field {} references unknown player {}",
                record.id, misc.field_id, player_id
            );
        }
    }
}
