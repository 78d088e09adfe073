//! [`Engine`]: the study operations, generic over any [`StudyStore`].

use std::{
  collections::{HashMap, HashSet},
  sync::Arc,
};

use chrono::{DateTime, Utc};
use kado_core::{
  Error, Result,
  error::ITEMS,
  import::{self, Candidate, ImportOutcome, ImportReport},
  item::{Item, ItemUpdate},
  progress::{Mastery, Outcome, ProgressRecord},
  scheduler::{self, MasteryStats},
  score::ScoreRecord,
  session::{GradedTest, SessionTracker, TestPlan},
  settings::StudyPreferences,
  store::StudyStore,
  user::UserId,
};
use kado_store_sqlite::SqliteStore;
use rand::Rng;
use serde::Serialize;
use tokio::sync::OnceCell;

use crate::{EngineConfig, catalog};

/// Lift a backend error into the shared taxonomy.
fn store_err<E: Into<Error>>(e: E) -> Error { e.into() }

/// An item annotated with one user's mastery of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
  pub item:    Item,
  pub mastery: Mastery,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// The study engine.
///
/// Cheap to share: wrap it in an `Arc` or clone the store handle it holds.
pub struct Engine<S> {
  store:           Arc<S>,
  seed:            Vec<Item>,
  question_counts: Vec<usize>,
  time_limit_secs: Option<u64>,
  initialized:     OnceCell<usize>,
}

impl Engine<SqliteStore> {
  /// Open the SQLite store named by `config`, and seed it if configured.
  pub async fn open(config: &EngineConfig) -> crate::Result<Self> {
    let seed = match &config.catalog_path {
      Some(path) => catalog::from_file(path)?,
      None => catalog::builtin()?,
    };

    let path = config.resolved_store_path();
    let store = SqliteStore::open(&path).await.map_err(Error::from)?;
    tracing::info!(path = %path.display(), "opened study store");

    let engine = Self::new(Arc::new(store), seed)
      .with_question_counts(config.question_counts.clone())
      .with_time_limit(config.test_time_limit_secs);

    if config.seed_on_open {
      engine.initialize().await?;
    }
    Ok(engine)
  }
}

impl<S: StudyStore> Engine<S> {
  /// An engine over `store` that seeds from `seed` on [`Engine::initialize`].
  pub fn new(store: Arc<S>, seed: Vec<Item>) -> Self {
    let defaults = EngineConfig::default();
    Self {
      store,
      seed,
      question_counts: defaults.question_counts,
      time_limit_secs: defaults.test_time_limit_secs,
      initialized: OnceCell::new(),
    }
  }

  pub fn with_question_counts(mut self, counts: Vec<usize>) -> Self {
    self.question_counts = counts;
    self
  }

  pub fn with_time_limit(mut self, secs: Option<u64>) -> Self {
    self.time_limit_secs = secs;
    self
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  /// Test lengths callers may request from [`Engine::build_test`].
  pub fn question_counts(&self) -> &[usize] { &self.question_counts }

  pub fn time_limit_secs(&self) -> Option<u64> { self.time_limit_secs }

  // ── Initialisation ────────────────────────────────────────────────────────

  /// Seed the catalog if it is empty. Runs at most once per engine; later
  /// calls return the count from the first run.
  pub async fn initialize(&self) -> Result<usize> {
    let inserted = self
      .initialized
      .get_or_try_init(|| async {
        let inserted = self.store.seed_items(&self.seed).await.map_err(store_err)?;
        tracing::info!(inserted, catalog = self.seed.len(), "catalog initialised");
        Ok::<_, Error>(inserted)
      })
      .await?;
    Ok(*inserted)
  }

  // ── Catalog ───────────────────────────────────────────────────────────────

  pub async fn get_item(&self, id: &str) -> Result<Item> {
    self
      .store
      .get_item(id)
      .await
      .map_err(store_err)?
      .ok_or_else(|| Error::not_found(ITEMS, id))
  }

  pub async fn list_items(&self) -> Result<Vec<Item>> {
    self.store.list_items().await.map_err(store_err)
  }

  /// Add a new item. Fails with `DuplicateKey` if the identifier exists.
  pub async fn add_item(&self, item: Item) -> Result<Item> {
    item.validate()?;
    self.store.add_item(&item).await.map_err(store_err)?;
    tracing::info!(item = %item.id, "added item");
    Ok(item)
  }

  /// Replace the mutable fields of an existing item.
  pub async fn update_item(&self, id: &str, update: ItemUpdate) -> Result<Item> {
    let mut item = self.get_item(id).await?;
    item.apply(update);
    item.validate()?;
    self.store.put_item(&item).await.map_err(store_err)?;
    tracing::debug!(item = %item.id, "updated item");
    Ok(item)
  }

  /// Delete an item and every user's progress on it.
  pub async fn delete_item(&self, id: &str) -> Result<()> {
    self.store.delete_item(id).await.map_err(store_err)?;
    tracing::info!(item = id, "deleted item");
    Ok(())
  }

  /// Import a JSON array of items, or a single item object.
  ///
  /// Each record is validated and inserted on its own; failures are reported
  /// in the returned [`ImportReport`] and never abort the batch. Only a
  /// payload that is not JSON at all fails the call.
  pub async fn bulk_import(&self, payload: &str) -> Result<ImportReport> {
    let candidates = import::parse_payload(payload)?;
    Ok(self.import_candidates(candidates).await)
  }

  /// As [`Engine::bulk_import`] for an already-parsed JSON value.
  pub async fn import_value(&self, payload: serde_json::Value) -> Result<ImportReport> {
    let candidates = import::candidates(payload)?;
    Ok(self.import_candidates(candidates).await)
  }

  async fn import_candidates(&self, candidates: Vec<Candidate>) -> ImportReport {
    let mut report = ImportReport::default();

    for candidate in candidates {
      let outcome = match candidate {
        Candidate::Malformed { index, id, reason } => {
          tracing::warn!(index, ?id, %reason, "skipping malformed import record");
          ImportOutcome::Malformed { index, id, reason }
        }
        Candidate::Valid(item) => {
          let added: Result<()> = self.store.add_item(&item).await.map_err(store_err);
          match added {
            Ok(()) => ImportOutcome::Added { id: item.id },
            Err(e) if e.is_duplicate_key() => {
              tracing::warn!(item = %item.id, "skipping duplicate import record");
              ImportOutcome::Duplicate { id: item.id }
            }
            Err(e) => {
              tracing::warn!(item = %item.id, error = %e, "import record rejected by store");
              ImportOutcome::Failed { id: item.id, reason: e.to_string() }
            }
          }
        }
      };
      report.outcomes.push(outcome);
    }

    tracing::info!(added = report.added(), failed = report.failed(), "bulk import finished");
    report
  }

  // ── Scheduling ────────────────────────────────────────────────────────────

  /// Identifiers of catalog items due for `user` at `now`, in catalog order.
  pub async fn due_items(&self, user: &UserId, now: DateTime<Utc>) -> Result<Vec<String>> {
    let items = self.store.list_items().await.map_err(store_err)?;
    let progress = self.store.list_progress(user).await.map_err(store_err)?;
    let due = scheduler::due_items(items.iter().map(|i| i.id.as_str()), &progress, now);
    tracing::debug!(user = %user, due = due.len(), "computed due items");
    Ok(due)
  }

  /// [`Engine::due_items`] in uniformly random order.
  pub async fn due_items_shuffled<R: Rng + ?Sized>(
    &self,
    user: &UserId,
    now: DateTime<Utc>,
    rng: &mut R,
  ) -> Result<Vec<String>> {
    let mut due = self.due_items(user, now).await?;
    scheduler::shuffle(&mut due, rng);
    Ok(due)
  }

  /// Record a reviewer's verdict on an item. Fails with `NotFound` if the
  /// item is not in the catalog.
  pub async fn record_outcome(
    &self,
    user: &UserId,
    item_id: &str,
    outcome: Outcome,
    now: DateTime<Utc>,
  ) -> Result<ProgressRecord> {
    if self.store.get_item(item_id).await.map_err(store_err)?.is_none() {
      return Err(Error::not_found(ITEMS, item_id));
    }

    let record = scheduler::apply_outcome(user.clone(), item_id, outcome, now);
    self.store.put_progress(&record).await.map_err(store_err)?;
    tracing::debug!(
      user = %user,
      item = item_id,
      mastery = %record.mastery,
      interval = record.interval_days,
      "recorded outcome"
    );
    Ok(record)
  }

  pub async fn progress(&self, user: &UserId, item_id: &str) -> Result<Option<ProgressRecord>> {
    self.store.get_progress(user, item_id).await.map_err(store_err)
  }

  /// How the catalog breaks down by mastery for `user`.
  pub async fn mastery_stats(&self, user: &UserId) -> Result<MasteryStats> {
    let items = self.store.list_items().await.map_err(store_err)?;
    let progress = self.store.list_progress(user).await.map_err(store_err)?;
    Ok(scheduler::mastery_stats(items.iter().map(|i| i.id.as_str()), &progress))
  }

  /// Every catalog item with `user`'s mastery of it (`new` if unreviewed).
  pub async fn catalog_with_mastery(&self, user: &UserId) -> Result<Vec<CatalogEntry>> {
    let items = self.store.list_items().await.map_err(store_err)?;
    let progress = self.store.list_progress(user).await.map_err(store_err)?;
    let by_item: HashMap<&str, &ProgressRecord> =
      progress.iter().map(|p| (p.item_id.as_str(), p)).collect();

    Ok(
      items
        .into_iter()
        .map(|item| {
          let mastery = scheduler::mastery_of(&item.id, &by_item);
          CatalogEntry { item, mastery }
        })
        .collect(),
    )
  }

  // ── Sessions & tests ──────────────────────────────────────────────────────

  /// Draw the questions for a test: the whole catalog or only due items,
  /// shuffled, truncated to `plan.question_count`.
  pub async fn build_test<R: Rng + ?Sized>(
    &self,
    user: &UserId,
    plan: &TestPlan,
    now: DateTime<Utc>,
    rng: &mut R,
  ) -> Result<Vec<Item>> {
    if !self.question_counts.contains(&plan.question_count) {
      return Err(Error::MalformedInput(format!(
        "question count {} is not one of {:?}",
        plan.question_count, self.question_counts
      )));
    }

    let mut pool = self.store.list_items().await.map_err(store_err)?;
    if plan.due_only {
      let progress = self.store.list_progress(user).await.map_err(store_err)?;
      let due: HashSet<String> =
        scheduler::due_items(pool.iter().map(|i| i.id.as_str()), &progress, now)
          .into_iter()
          .collect();
      pool.retain(|item| due.contains(&item.id));
    }

    scheduler::shuffle(&mut pool, rng);
    pool.truncate(plan.question_count);
    Ok(pool)
  }

  /// Append the score for a finished practice session.
  pub async fn finalize_session(
    &self,
    tracker: SessionTracker,
    test_kind: &str,
    elapsed_seconds: u64,
    now: DateTime<Utc>,
  ) -> Result<ScoreRecord> {
    let score = tracker.finalize(test_kind, elapsed_seconds, now);
    let record = self.store.add_score(score).await.map_err(store_err)?;
    tracing::info!(
      score_id = record.score_id,
      correct = record.correct,
      total = record.total,
      "session finalized"
    );
    Ok(record)
  }

  /// Append the score for a graded test. Elapsed time is capped at the
  /// configured time limit.
  pub async fn finalize_test(
    &self,
    graded: GradedTest,
    elapsed_seconds: u64,
    now: DateTime<Utc>,
  ) -> Result<ScoreRecord> {
    let elapsed = match self.time_limit_secs {
      Some(limit) => elapsed_seconds.min(limit),
      None => elapsed_seconds,
    };
    let kind = graded.kind.label();
    self.finalize_session(graded.tracker, kind, elapsed, now).await
  }

  /// Every recorded score, most recent first.
  pub async fn score_history(&self) -> Result<Vec<ScoreRecord>> {
    let mut scores = self.store.list_scores().await.map_err(store_err)?;
    // Stable sort keeps the store's tie order for equal timestamps.
    scores.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
    Ok(scores)
  }

  // ── Preferences ───────────────────────────────────────────────────────────

  pub async fn preferences(&self) -> Result<StudyPreferences> {
    let settings = self.store.list_settings().await.map_err(store_err)?;
    StudyPreferences::from_settings(&settings)
  }

  pub async fn save_preferences(&self, prefs: &StudyPreferences) -> Result<()> {
    for setting in prefs.to_settings()? {
      self.store.put_setting(&setting).await.map_err(store_err)?;
    }
    Ok(())
  }
}
