//! Key/value settings and the study preferences stored in them.
//!
//! Preferences are an explicit value handed to whoever renders cards; nothing
//! in the scheduler reads them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

pub const FRONT_FIELDS_KEY: &str = "cardFrontFields";
pub const BACK_FIELDS_KEY: &str = "cardBackFields";
pub const DARK_MODE_KEY: &str = "darkMode";

/// One row of the `settings` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
  pub key:   String,
  pub value: Value,
}

/// A field of an [`Item`](crate::item::Item) that can be shown on a card face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CardField {
  #[serde(alias = "kanji")]
  Item,
  Meaning,
  #[serde(alias = "onyomi")]
  PrimaryReadings,
  #[serde(alias = "kunyomi")]
  SecondaryReadings,
  Examples,
}

/// Which fields go on each face of a card, plus display mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyPreferences {
  pub front_fields: Vec<CardField>,
  pub back_fields:  Vec<CardField>,
  pub dark_mode:    bool,
}

impl Default for StudyPreferences {
  fn default() -> Self {
    Self {
      front_fields: vec![CardField::Item],
      back_fields:  vec![
        CardField::Meaning,
        CardField::PrimaryReadings,
        CardField::SecondaryReadings,
        CardField::Examples,
      ],
      dark_mode:    false,
    }
  }
}

impl StudyPreferences {
  /// Rebuild preferences from stored settings. Keys that are absent keep
  /// their defaults; unrelated keys are ignored.
  pub fn from_settings(settings: &[Setting]) -> Result<Self> {
    let mut prefs = Self::default();
    for setting in settings {
      match setting.key.as_str() {
        FRONT_FIELDS_KEY => prefs.front_fields = decode(setting)?,
        BACK_FIELDS_KEY => prefs.back_fields = decode(setting)?,
        DARK_MODE_KEY => prefs.dark_mode = decode(setting)?,
        _ => {}
      }
    }
    Ok(prefs)
  }

  pub fn to_settings(&self) -> Result<Vec<Setting>> {
    Ok(vec![
      Setting { key: FRONT_FIELDS_KEY.into(), value: serde_json::to_value(&self.front_fields)? },
      Setting { key: BACK_FIELDS_KEY.into(), value: serde_json::to_value(&self.back_fields)? },
      Setting { key: DARK_MODE_KEY.into(), value: Value::Bool(self.dark_mode) },
    ])
  }
}

fn decode<T: serde::de::DeserializeOwned>(setting: &Setting) -> Result<T> {
  serde_json::from_value(setting.value.clone())
    .map_err(|e| Error::MalformedInput(format!("setting {:?}: {e}", setting.key)))
}
