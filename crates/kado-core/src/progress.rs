//! Per-user, per-item review state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::user::UserId;

/// Interval assigned when a reviewer marks an item hard.
pub const LEARNING_INTERVAL_DAYS: u32 = 1;
/// Interval assigned when a reviewer marks an item known.
pub const KNOWN_INTERVAL_DAYS: u32 = 7;

// ─── Mastery ─────────────────────────────────────────────────────────────────

/// How well a user knows an item. An item with no record is [`Mastery::New`].
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mastery {
  #[default]
  New,
  Learning,
  Known,
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// The two grades a reviewer can report for a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
  /// Needs another look tomorrow.
  Hard,
  /// Come back in a week.
  Known,
}

impl Outcome {
  pub fn mastery(self) -> Mastery {
    match self {
      Self::Hard => Mastery::Learning,
      Self::Known => Mastery::Known,
    }
  }

  pub fn interval_days(self) -> u32 {
    match self {
      Self::Hard => LEARNING_INTERVAL_DAYS,
      Self::Known => KNOWN_INTERVAL_DAYS,
    }
  }
}

// ─── ProgressRecord ──────────────────────────────────────────────────────────

/// Scheduling state for one (user, item) pair. At most one exists per pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
  pub user_id:       UserId,
  pub item_id:       String,
  pub mastery:       Mastery,
  /// Days until the item is due again, counted from `last_seen`.
  pub interval_days: u32,
  pub last_seen:     Option<DateTime<Utc>>,
}

impl ProgressRecord {
  /// The composite `user|item` key this record is stored under.
  pub fn key(&self) -> String { progress_key(&self.user_id, &self.item_id) }
}

/// Build the composite `user|item` key for the `progress` collection.
pub fn progress_key(user_id: &UserId, item_id: &str) -> String {
  format!("{user_id}|{item_id}")
}
