//! The due-card algorithm and the mastery state machine.
//!
//! Everything here is pure: the current time is always a parameter and no
//! function touches storage. The engine loads records, calls into this
//! module, and writes back whatever it returns.

use std::collections::HashMap;

use chrono::{DateTime, SubsecRound as _, TimeDelta, Utc};
use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::{
  progress::{Mastery, Outcome, ProgressRecord},
  user::UserId,
};

/// Length of one interval day in milliseconds.
pub const MS_PER_DAY: i64 = 86_400_000;

// ─── Due-ness ────────────────────────────────────────────────────────────────

/// The instant a reviewed record becomes due again, or `None` if it has never
/// been seen (and is therefore due immediately).
pub fn next_due(record: &ProgressRecord) -> Option<DateTime<Utc>> {
  let last_seen = record.last_seen?;
  let interval = TimeDelta::milliseconds(i64::from(record.interval_days) * MS_PER_DAY);
  // An unrepresentable instant is treated as "never".
  Some(last_seen.checked_add_signed(interval).unwrap_or(DateTime::<Utc>::MAX_UTC))
}

/// Whether an item is due for review given the user's record for it.
///
/// No record, or a record that was never seen, is always due. Otherwise the
/// item is due once `last_seen + interval` has been reached (inclusive).
pub fn is_due(record: Option<&ProgressRecord>, now: DateTime<Utc>) -> bool {
  match record.and_then(next_due) {
    None => true,
    Some(due_at) => due_at <= now,
  }
}

/// Identifiers from `catalog` that are due for the user whose records are
/// `progress`.
///
/// `progress` must hold a single user's records. The result follows catalog
/// order; use [`shuffle`] if a random order is wanted.
pub fn due_items<'a, I>(catalog: I, progress: &[ProgressRecord], now: DateTime<Utc>) -> Vec<String>
where
  I: IntoIterator<Item = &'a str>,
{
  let by_item: HashMap<&str, &ProgressRecord> =
    progress.iter().map(|p| (p.item_id.as_str(), p)).collect();

  catalog
    .into_iter()
    .filter(|id| is_due(by_item.get(id).copied(), now))
    .map(str::to_owned)
    .collect()
}

/// Uniform in-place shuffle (Fisher-Yates).
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) { items.shuffle(rng); }

// ─── Transitions ─────────────────────────────────────────────────────────────

/// The record that results from reporting `outcome` at `now`.
///
/// Prior state does not matter: both outcomes land on a fixed point
/// (`learning`/1 day or `known`/7 days). `last_seen` is truncated to the
/// millisecond, the precision the store keeps.
pub fn apply_outcome(
  user_id: UserId,
  item_id: impl Into<String>,
  outcome: Outcome,
  now: DateTime<Utc>,
) -> ProgressRecord {
  ProgressRecord {
    user_id,
    item_id: item_id.into(),
    mastery: outcome.mastery(),
    interval_days: outcome.interval_days(),
    last_seen: Some(now.trunc_subsecs(3)),
  }
}

// ─── Statistics ──────────────────────────────────────────────────────────────

/// How a user's catalog breaks down by mastery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasteryStats {
  pub total:    usize,
  pub new:      usize,
  pub learning: usize,
  pub known:    usize,
}

/// Look up the mastery of each catalog item. Items without a record are new.
pub fn mastery_of<'a>(item_id: &str, by_item: &HashMap<&'a str, &'a ProgressRecord>) -> Mastery {
  by_item.get(item_id).map(|p| p.mastery).unwrap_or_default()
}

/// Count catalog items per mastery level. Records for items missing from the
/// catalog are ignored.
pub fn mastery_stats<'a, I>(catalog: I, progress: &[ProgressRecord]) -> MasteryStats
where
  I: IntoIterator<Item = &'a str>,
{
  let by_item: HashMap<&str, &ProgressRecord> =
    progress.iter().map(|p| (p.item_id.as_str(), p)).collect();

  let mut stats = MasteryStats::default();
  for id in catalog {
    stats.total += 1;
    match mastery_of(id, &by_item) {
      Mastery::New => stats.new += 1,
      Mastery::Learning => stats.learning += 1,
      Mastery::Known => stats.known += 1,
    }
  }
  stats
}
