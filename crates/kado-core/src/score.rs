//! Score history records.
//!
//! Scores are append-only: once a session is finalized its record is never
//! updated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Rounded percentage of correct answers; `0` for an empty session.
pub fn percentage(correct: u32, total: u32) -> u8 {
  if total == 0 {
    return 0;
  }
  let correct = u64::from(correct.min(total));
  let total = u64::from(total);
  // Integer round-half-up of correct / total * 100.
  ((correct * 200 + total) / (2 * total)) as u8
}

/// A persisted score. `score_id` is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
  pub score_id:        i64,
  pub correct:         u32,
  pub total:           u32,
  pub percentage:      u8,
  pub elapsed_seconds: u64,
  /// Human label of the kind of session, e.g. "Item → Meaning".
  pub test_kind:       String,
  pub recorded_at:     DateTime<Utc>,
}

/// Input to [`crate::store::StudyStore::add_score`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScore {
  pub correct:         u32,
  pub total:           u32,
  pub elapsed_seconds: u64,
  pub test_kind:       String,
  pub recorded_at:     DateTime<Utc>,
}

impl NewScore {
  pub fn percentage(&self) -> u8 { percentage(self.correct, self.total) }

  pub fn validate(&self) -> Result<()> {
    if self.correct > self.total {
      return Err(Error::MalformedInput(format!(
        "score has {} correct out of {} total",
        self.correct, self.total
      )));
    }
    Ok(())
  }
}
