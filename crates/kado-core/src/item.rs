//! Items: the units of study content.
//!
//! Items are keyed by a caller-chosen identifier (typically a single glyph).
//! The identifier is immutable; every other field is replaced wholesale by an
//! admin edit.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Example ─────────────────────────────────────────────────────────────────

/// A usage example shown on the back of a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Example {
  /// The example in the studied script.
  #[serde(alias = "japanese")]
  pub source:      String,
  pub reading:     String,
  #[serde(alias = "english")]
  pub translation: String,
}

// ─── Item ────────────────────────────────────────────────────────────────────

/// A study item as stored in the `items` collection.
///
/// The serialised shape is camelCase. The field names used by the legacy
/// kanji catalog (`kanji`, `onyomi`, `kunyomi`) are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Item {
  #[serde(alias = "kanji")]
  pub id:                 String,
  pub meaning:            String,
  #[serde(default, alias = "onyomi")]
  pub primary_readings:   Vec<String>,
  #[serde(default, alias = "kunyomi")]
  pub secondary_readings: Vec<String>,
  #[serde(default)]
  pub examples:           Vec<Example>,
}

impl Item {
  /// Convenience constructor with empty readings and examples.
  pub fn new(id: impl Into<String>, meaning: impl Into<String>) -> Self {
    Self {
      id:                 id.into(),
      meaning:            meaning.into(),
      primary_readings:   Vec::new(),
      secondary_readings: Vec::new(),
      examples:           Vec::new(),
    }
  }

  /// Structural checks serde cannot express.
  pub fn validate(&self) -> Result<()> {
    if self.id.trim().is_empty() {
      return Err(Error::MalformedInput("item id must not be empty".into()));
    }
    if self.id.trim() != self.id {
      return Err(Error::MalformedInput(format!(
        "item id {:?} has surrounding whitespace",
        self.id
      )));
    }
    if self.meaning.trim().is_empty() {
      return Err(Error::MalformedInput(format!(
        "item {:?} has an empty meaning",
        self.id
      )));
    }
    Ok(())
  }

  /// Replace every mutable field with the contents of `update`.
  pub fn apply(&mut self, update: ItemUpdate) {
    self.meaning = update.meaning;
    self.primary_readings = update.primary_readings;
    self.secondary_readings = update.secondary_readings;
    self.examples = update.examples;
  }

  /// The primary readings joined the way they are displayed and graded.
  pub fn primary_reading_text(&self) -> String { self.primary_readings.join("、") }
}

// ─── ItemUpdate ──────────────────────────────────────────────────────────────

/// Input to an admin edit: a full replacement of the mutable fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ItemUpdate {
  pub meaning:            String,
  #[serde(default)]
  pub primary_readings:   Vec<String>,
  #[serde(default)]
  pub secondary_readings: Vec<String>,
  #[serde(default)]
  pub examples:           Vec<Example>,
}

impl From<Item> for ItemUpdate {
  fn from(item: Item) -> Self {
    Self {
      meaning:            item.meaning,
      primary_readings:   item.primary_readings,
      secondary_readings: item.secondary_readings,
      examples:           item.examples,
    }
  }
}
