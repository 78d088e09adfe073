//! The `StudyStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `kado-store-sqlite`).
//! The engine depends on this abstraction, not on any concrete backend.
//!
//! Each named collection (`items`, `progress`, `scores`, `settings`) gets a
//! typed method per verb instead of a stringly-typed `get(collection, key)`.

use std::future::Future;

use crate::{
  item::Item,
  progress::ProgressRecord,
  score::{NewScore, ScoreRecord},
  settings::Setting,
  user::UserId,
};

/// Abstraction over durable storage for the study engine.
///
/// Every failed write is returned to the caller. Backend errors convert into
/// [`crate::Error`] so callers can distinguish `DuplicateKey`, `NotFound` and
/// `StorageUnavailable` without knowing the backend.
///
/// All methods return `Send` futures so the trait can be used from
/// multi-threaded async runtimes.
pub trait StudyStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + Into<crate::Error> + 'static;

  // ── Items ─────────────────────────────────────────────────────────────

  /// Retrieve an item by identifier. Returns `None` if not found.
  fn get_item<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Item>, Self::Error>> + Send + 'a;

  /// All items, ordered by identifier.
  fn list_items(&self) -> impl Future<Output = Result<Vec<Item>, Self::Error>> + Send + '_;

  fn count_items(&self) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Insert a new item. Fails with a duplicate-key error if the identifier
  /// is taken.
  fn add_item<'a>(
    &'a self,
    item: &'a Item,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Insert or fully replace an item.
  fn put_item<'a>(
    &'a self,
    item: &'a Item,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Delete an item and every progress record for it, across all users.
  /// Fails with a not-found error if the item does not exist.
  fn delete_item<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Bulk-load `items` only if the `items` collection is empty.
  ///
  /// Returns the number of items inserted: zero when the catalog was already
  /// populated. Concurrent calls never fail on duplicate keys.
  fn seed_items<'a>(
    &'a self,
    items: &'a [Item],
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  // ── Progress ──────────────────────────────────────────────────────────

  fn get_progress<'a>(
    &'a self,
    user_id: &'a UserId,
    item_id: &'a str,
  ) -> impl Future<Output = Result<Option<ProgressRecord>, Self::Error>> + Send + 'a;

  /// Every progress record belonging to `user_id`.
  fn list_progress<'a>(
    &'a self,
    user_id: &'a UserId,
  ) -> impl Future<Output = Result<Vec<ProgressRecord>, Self::Error>> + Send + 'a;

  /// Every progress record for every user.
  fn list_all_progress(
    &self,
  ) -> impl Future<Output = Result<Vec<ProgressRecord>, Self::Error>> + Send + '_;

  /// Insert or replace the record for `(record.user_id, record.item_id)`.
  fn put_progress<'a>(
    &'a self,
    record: &'a ProgressRecord,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Scores (append-only) ──────────────────────────────────────────────

  /// Append a score and return it with its assigned sequence number.
  fn add_score(
    &self,
    score: NewScore,
  ) -> impl Future<Output = Result<ScoreRecord, Self::Error>> + Send + '_;

  /// All scores, most recent first.
  fn list_scores(&self) -> impl Future<Output = Result<Vec<ScoreRecord>, Self::Error>> + Send + '_;

  // ── Settings ──────────────────────────────────────────────────────────

  fn get_setting<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<Setting>, Self::Error>> + Send + 'a;

  fn put_setting<'a>(
    &'a self,
    setting: &'a Setting,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn list_settings(&self) -> impl Future<Output = Result<Vec<Setting>, Self::Error>> + Send + '_;
}
