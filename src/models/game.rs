//! Game definitions: scoring fields and miscellaneous fields.

use serde::{Deserialize, Serialize};

use super::{FieldId, GameId};

/// A numeric field that contributes to a player's total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreField {
    pub id: FieldId,
    pub name: String,
}

/// Value type of a miscellaneous field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MiscFieldType {
    /// Free text, or a categorical value when `options` is non-empty
    Text {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        options: Vec<String>,
    },
    /// Numeric value, optionally restricted to `options`
    Number {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        options: Vec<String>,
    },
    Date,
    Boolean,
}

impl Default for MiscFieldType {
    fn default() -> Self {
        MiscFieldType::Text {
            options: Vec::new(),
        }
    }
}

/// A non-scoring attribute of a play or of a player within a play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiscField {
    pub id: FieldId,
    pub name: String,

    #[serde(flatten)]
    pub field_type: MiscFieldType,

    /// Whether each player records their own value
    #[serde(default)]
    pub value_per_player: bool,

    /// Whether the field is offered as a report dimension
    #[serde(default)]
    pub is_relevant_report_dimension: bool,
}

impl MiscField {
    /// Create a free-text field.
    pub fn text(id: impl Into<FieldId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            field_type: MiscFieldType::default(),
            value_per_player: false,
            is_relevant_report_dimension: false,
        }
    }

    /// Create a numeric field.
    pub fn number(id: impl Into<FieldId>, name: impl Into<String>) -> Self {
        Self {
            field_type: MiscFieldType::Number {
                options: Vec::new(),
            },
            ..Self::text(id, name)
        }
    }

    /// Builder method to set the enumerated options.
    ///
    /// Has no effect on date and boolean fields.
    pub fn with_options<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        match &mut self.field_type {
            MiscFieldType::Text { options } | MiscFieldType::Number { options } => {
                *options = values;
            }
            MiscFieldType::Date | MiscFieldType::Boolean => {}
        }
        self
    }

    /// Builder method to mark the field as per-player.
    pub fn per_player(mut self) -> Self {
        self.value_per_player = true;
        self
    }

    /// Builder method to mark the field as a report dimension.
    pub fn report_dimension(mut self) -> Self {
        self.is_relevant_report_dimension = true;
        self
    }

    /// Declared option values, empty when the field is unrestricted.
    pub fn options(&self) -> &[String] {
        match &self.field_type {
            MiscFieldType::Text { options } | MiscFieldType::Number { options } => options,
            MiscFieldType::Date | MiscFieldType::Boolean => &[],
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.field_type, MiscFieldType::Number { .. })
    }
}

/// A game definition as stored alongside the plays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: GameId,
    pub name: String,

    #[serde(default)]
    pub score_fields: Vec<ScoreField>,

    #[serde(default)]
    pub misc_fields: Vec<MiscField>,

    /// All players act at once, so seat order carries no meaning
    #[serde(default)]
    pub simultaneous_turns: bool,
}

impl Game {
    /// Create a game without fields.
    pub fn new(id: impl Into<GameId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            score_fields: Vec::new(),
            misc_fields: Vec::new(),
            simultaneous_turns: false,
        }
    }

    /// Builder method to add a scoring field.
    pub fn with_score_field(mut self, id: impl Into<FieldId>, name: impl Into<String>) -> Self {
        self.score_fields.push(ScoreField {
            id: id.into(),
            name: name.into(),
        });
        self
    }

    /// Builder method to add a misc field.
    pub fn with_misc_field(mut self, field: MiscField) -> Self {
        self.misc_fields.push(field);
        self
    }

    /// Builder method to flag simultaneous turns.
    pub fn with_simultaneous_turns(mut self) -> Self {
        self.simultaneous_turns = true;
        self
    }

    /// Get a misc field definition by ID.
    pub fn misc_field(&self, id: &str) -> Option<&MiscField> {
        self.misc_fields.iter().find(|f| f.id.as_str() == id)
    }

    /// Misc fields flagged as report dimensions.
    pub fn report_dimensions(&self) -> impl Iterator<Item = &MiscField> {
        self.misc_fields
            .iter()
            .filter(|f| f.is_relevant_report_dimension)
    }
}
