//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings with millisecond
//! precision, so lexical order equals chronological order. Reading and
//! example lists are stored as compact JSON.

use std::str::FromStr as _;

use chrono::{DateTime, SecondsFormat, Utc};
use kado_core::{
  item::{Example, Item},
  progress::{Mastery, ProgressRecord},
  score::ScoreRecord,
  settings::Setting,
  user::UserId,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Millis, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Mastery ─────────────────────────────────────────────────────────────────

pub fn encode_mastery(m: Mastery) -> &'static str {
  match m {
    Mastery::New => "new",
    Mastery::Learning => "learning",
    Mastery::Known => "known",
  }
}

/// A missing mastery column reads as [`Mastery::New`].
pub fn decode_mastery(s: Option<&str>) -> Result<Mastery> {
  match s {
    None => Ok(Mastery::New),
    Some(s) => {
      Mastery::from_str(s).map_err(|_| Error::Decode(format!("unknown mastery: {s:?}")))
    }
  }
}

// ─── Integers ────────────────────────────────────────────────────────────────

pub fn decode_u32(column: &str, v: i64) -> Result<u32> {
  u32::try_from(v).map_err(|_| Error::Decode(format!("{column} out of range: {v}")))
}

// ─── Lists ───────────────────────────────────────────────────────────────────

pub fn encode_strings(list: &[String]) -> Result<String> { Ok(serde_json::to_string(list)?) }

pub fn decode_strings(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

pub fn encode_examples(list: &[Example]) -> Result<String> { Ok(serde_json::to_string(list)?) }

pub fn decode_examples(s: &str) -> Result<Vec<Example>> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// An item with every column already encoded, ready to move into a
/// `tokio_rusqlite` closure.
pub struct EncodedItem {
  pub item_id:            String,
  pub meaning:            String,
  pub primary_readings:   String,
  pub secondary_readings: String,
  pub examples:           String,
}

impl EncodedItem {
  pub fn new(item: &Item) -> Result<Self> {
    Ok(Self {
      item_id:            item.id.clone(),
      meaning:            item.meaning.clone(),
      primary_readings:   encode_strings(&item.primary_readings)?,
      secondary_readings: encode_strings(&item.secondary_readings)?,
      examples:           encode_examples(&item.examples)?,
    })
  }
}

/// Raw strings read directly from an `items` row. Column order matches
/// [`ITEM_COLUMNS`].
pub struct RawItem {
  pub item_id:            String,
  pub meaning:            String,
  pub primary_readings:   String,
  pub secondary_readings: String,
  pub examples:           String,
}

pub const ITEM_COLUMNS: &str =
  "item_id, meaning, primary_readings, secondary_readings, examples";

impl RawItem {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      item_id:            row.get(0)?,
      meaning:            row.get(1)?,
      primary_readings:   row.get(2)?,
      secondary_readings: row.get(3)?,
      examples:           row.get(4)?,
    })
  }

  pub fn into_item(self) -> Result<Item> {
    Ok(Item {
      id:                 self.item_id,
      meaning:            self.meaning,
      primary_readings:   decode_strings(&self.primary_readings)?,
      secondary_readings: decode_strings(&self.secondary_readings)?,
      examples:           decode_examples(&self.examples)?,
    })
  }
}

/// Raw values read directly from a `progress` row.
pub struct RawProgress {
  pub user_id:       String,
  pub item_id:       String,
  pub mastery:       Option<String>,
  pub interval_days: i64,
  pub last_seen:     Option<String>,
}

pub const PROGRESS_COLUMNS: &str = "user_id, item_id, mastery, interval_days, last_seen";

impl RawProgress {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      item_id:       row.get(1)?,
      mastery:       row.get(2)?,
      interval_days: row.get(3)?,
      last_seen:     row.get(4)?,
    })
  }

  pub fn into_record(self) -> Result<ProgressRecord> {
    Ok(ProgressRecord {
      user_id:       UserId::new(self.user_id),
      item_id:       self.item_id,
      mastery:       decode_mastery(self.mastery.as_deref())?,
      interval_days: decode_u32("interval_days", self.interval_days)?,
      last_seen:     self.last_seen.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw values read directly from a `scores` row.
pub struct RawScore {
  pub score_id:        i64,
  pub correct:         i64,
  pub total:           i64,
  pub percentage:      i64,
  pub elapsed_seconds: i64,
  pub test_kind:       String,
  pub recorded_at:     String,
}

pub const SCORE_COLUMNS: &str =
  "score_id, correct, total, percentage, elapsed_seconds, test_kind, recorded_at";

impl RawScore {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      score_id:        row.get(0)?,
      correct:         row.get(1)?,
      total:           row.get(2)?,
      percentage:      row.get(3)?,
      elapsed_seconds: row.get(4)?,
      test_kind:       row.get(5)?,
      recorded_at:     row.get(6)?,
    })
  }

  pub fn into_score(self) -> Result<ScoreRecord> {
    let percentage = u8::try_from(self.percentage)
      .map_err(|_| Error::Decode(format!("percentage out of range: {}", self.percentage)))?;
    let elapsed_seconds = u64::try_from(self.elapsed_seconds).map_err(|_| {
      Error::Decode(format!("elapsed_seconds out of range: {}", self.elapsed_seconds))
    })?;

    Ok(ScoreRecord {
      score_id: self.score_id,
      correct: decode_u32("correct", self.correct)?,
      total: decode_u32("total", self.total)?,
      percentage,
      elapsed_seconds,
      test_kind: self.test_kind,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw strings read directly from a `settings` row.
pub struct RawSetting {
  pub key:        String,
  pub value_json: String,
}

impl RawSetting {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { key: row.get(0)?, value_json: row.get(1)? })
  }

  pub fn into_setting(self) -> Result<Setting> {
    Ok(Setting { key: self.key, value: serde_json::from_str(&self.value_json)? })
  }
}
