//! End-to-end tests for `Engine` over the SQLite store.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use kado_core::{
  Error as CoreError,
  import::ImportOutcome,
  item::{Item, ItemUpdate},
  progress::{Mastery, Outcome},
  scheduler::MasteryStats,
  session::{SessionTracker, TestKind, TestPlan, grade_test},
  settings::{CardField, StudyPreferences},
  user::UserId,
};
use kado_engine::{Engine, EngineConfig, catalog, telemetry};
use kado_store_sqlite::SqliteStore;
use rand::{SeedableRng, rngs::StdRng};
use tempfile::TempDir;

fn t0() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 4, 1, 9, 30, 0).unwrap() }

fn alice() -> UserId { UserId::new("alice@example.com") }

fn bob() -> UserId { UserId::new("bob@example.com") }

fn small_catalog() -> Vec<Item> {
  vec![Item::new("日", "sun"), Item::new("月", "moon"), Item::new("火", "fire")]
}

async fn engine_with(seed: Vec<Item>) -> Engine<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.expect("in-memory store");
  let engine = Engine::new(Arc::new(store), seed);
  engine.initialize().await.expect("seed");
  engine
}

async fn engine() -> Engine<SqliteStore> { engine_with(small_catalog()).await }

// ─── Due items ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn unreviewed_items_are_due() {
  let e = engine().await;
  let due = e.due_items(&alice(), t0()).await.unwrap();
  assert_eq!(due.len(), 3);
  assert!(due.contains(&"日".to_owned()));
}

#[tokio::test]
async fn known_item_is_due_again_after_exactly_seven_days() {
  let e = engine().await;
  e.record_outcome(&alice(), "日", Outcome::Known, t0()).await.unwrap();

  let at_six = e.due_items(&alice(), t0() + TimeDelta::days(6)).await.unwrap();
  assert!(!at_six.contains(&"日".to_owned()));

  let at_seven = e.due_items(&alice(), t0() + TimeDelta::days(7)).await.unwrap();
  assert!(at_seven.contains(&"日".to_owned()));
}

#[tokio::test]
async fn hard_item_comes_back_the_next_day() {
  let e = engine().await;
  e.record_outcome(&alice(), "月", Outcome::Known, t0()).await.unwrap();
  let record = e
    .record_outcome(&alice(), "月", Outcome::Hard, t0() + TimeDelta::hours(1))
    .await
    .unwrap();
  assert_eq!((record.mastery, record.interval_days), (Mastery::Learning, 1));

  let later = t0() + TimeDelta::hours(1) + TimeDelta::days(1);
  assert!(e.due_items(&alice(), later).await.unwrap().contains(&"月".to_owned()));
}

#[tokio::test]
async fn recorded_outcome_matches_what_is_read_back() {
  let e = engine().await;
  let now = t0() + TimeDelta::microseconds(1_500);
  let returned = e.record_outcome(&alice(), "日", Outcome::Known, now).await.unwrap();
  let stored = e.progress(&alice(), "日").await.unwrap().unwrap();
  assert_eq!(returned, stored);

  let due_at = returned.last_seen.unwrap() + TimeDelta::days(7);
  let before = e.due_items(&alice(), due_at - TimeDelta::milliseconds(1)).await.unwrap();
  assert!(!before.contains(&"日".to_owned()));
  assert!(e.due_items(&alice(), due_at).await.unwrap().contains(&"日".to_owned()));
}

#[tokio::test]
async fn outcomes_always_land_on_fixed_intervals() {
  let e = engine().await;
  for (i, outcome) in [Outcome::Known, Outcome::Known, Outcome::Hard, Outcome::Known, Outcome::Hard]
    .into_iter()
    .enumerate()
  {
    let now = t0() + TimeDelta::days(i as i64 * 10);
    let r = e.record_outcome(&alice(), "火", outcome, now).await.unwrap();
    let expected = if outcome == Outcome::Known { 7 } else { 1 };
    assert_eq!(r.interval_days, expected);
    assert_eq!(r.last_seen, Some(now));
  }
  // Still one record for the pair.
  let stored = e.progress(&alice(), "火").await.unwrap().unwrap();
  assert_eq!(stored.interval_days, 1);
}

#[tokio::test]
async fn users_do_not_affect_each_other() {
  let e = engine().await;
  e.record_outcome(&alice(), "日", Outcome::Known, t0()).await.unwrap();
  e.record_outcome(&alice(), "月", Outcome::Known, t0()).await.unwrap();

  let now = t0() + TimeDelta::days(1);
  assert_eq!(e.due_items(&alice(), now).await.unwrap(), ["火"]);
  assert_eq!(e.due_items(&bob(), now).await.unwrap().len(), 3);
  assert_eq!(e.due_items(&UserId::guest(), now).await.unwrap().len(), 3);
}

#[tokio::test]
async fn shuffled_due_items_are_a_permutation() {
  let e = engine_with(catalog::builtin().unwrap()).await;
  let mut rng = StdRng::seed_from_u64(42);

  let mut plain = e.due_items(&alice(), t0()).await.unwrap();
  let mut shuffled = e.due_items_shuffled(&alice(), t0(), &mut rng).await.unwrap();
  plain.sort();
  shuffled.sort();
  assert_eq!(plain, shuffled);
}

#[tokio::test]
async fn outcome_for_unknown_item_is_not_found() {
  let e = engine().await;
  let err = e.record_outcome(&alice(), "木", Outcome::Known, t0()).await.unwrap_err();
  assert!(err.is_not_found());
  assert!(e.progress(&alice(), "木").await.unwrap().is_none());
}

#[tokio::test]
async fn stats_and_catalog_view_reflect_mastery() {
  let e = engine().await;
  e.record_outcome(&alice(), "日", Outcome::Known, t0()).await.unwrap();
  e.record_outcome(&alice(), "月", Outcome::Hard, t0()).await.unwrap();

  let stats = e.mastery_stats(&alice()).await.unwrap();
  assert_eq!(stats, MasteryStats { total: 3, new: 1, learning: 1, known: 1 });

  let view = e.catalog_with_mastery(&alice()).await.unwrap();
  let fire = view.iter().find(|entry| entry.item.id == "火").unwrap();
  assert_eq!(fire.mastery, Mastery::New);

  let bob_stats = e.mastery_stats(&bob()).await.unwrap();
  assert_eq!(bob_stats.new, 3);
}

// ─── Seeding ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn initialize_twice_does_not_duplicate() {
  let e = engine().await;
  assert_eq!(e.initialize().await.unwrap(), 3);
  assert_eq!(e.list_items().await.unwrap().len(), 3);
}

#[tokio::test]
async fn concurrent_engines_share_one_seed() {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let a = Engine::new(store.clone(), small_catalog());
  let b = Engine::new(store.clone(), small_catalog());

  let (ra, rb) = tokio::join!(a.initialize(), b.initialize());
  assert_eq!(ra.unwrap() + rb.unwrap(), 3);
  assert_eq!(a.list_items().await.unwrap().len(), 3);
}

#[tokio::test]
async fn concurrent_initialize_on_one_engine_seeds_once() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let e = Engine::new(Arc::new(store), small_catalog());

  let (first, second) = tokio::join!(e.initialize(), e.initialize());
  // Both callers observe the single run's count.
  assert_eq!(first.unwrap(), 3);
  assert_eq!(second.unwrap(), 3);
  assert_eq!(e.initialize().await.unwrap(), 3);
  assert_eq!(e.list_items().await.unwrap().len(), 3);
}

#[tokio::test]
async fn seeding_never_overwrites_an_edited_catalog() {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let first = Engine::new(store.clone(), small_catalog());
  first.initialize().await.unwrap();
  first.delete_item("火").await.unwrap();

  let second = Engine::new(store, small_catalog());
  assert_eq!(second.initialize().await.unwrap(), 0);
  assert_eq!(second.list_items().await.unwrap().len(), 2);
}

// ─── Catalog CRUD ────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_existing_item_is_duplicate_key() {
  let e = engine().await;
  let err = e.add_item(Item::new("日", "day")).await.unwrap_err();
  assert!(err.is_duplicate_key());
  assert_eq!(e.get_item("日").await.unwrap().meaning, "sun");
}

#[tokio::test]
async fn add_invalid_item_is_malformed() {
  let e = engine().await;
  let err = e.add_item(Item::new("", "nothing")).await.unwrap_err();
  assert!(matches!(err, CoreError::MalformedInput(_)));
}

#[tokio::test]
async fn update_replaces_fields_but_not_identity() {
  let e = engine().await;
  let updated = e
    .update_item("日", ItemUpdate {
      meaning:            "sun; day".into(),
      primary_readings:   vec!["ニチ".into()],
      secondary_readings: vec!["ひ".into()],
      examples:           vec![],
    })
    .await
    .unwrap();
  assert_eq!(updated.id, "日");
  assert_eq!(e.get_item("日").await.unwrap(), updated);
}

#[tokio::test]
async fn update_or_delete_missing_item_is_not_found() {
  let e = engine().await;
  let update = ItemUpdate::from(Item::new("木", "tree"));
  assert!(e.update_item("木", update).await.unwrap_err().is_not_found());
  assert!(e.delete_item("木").await.unwrap_err().is_not_found());
  assert!(e.get_item("木").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn delete_item_cascades_to_every_user() {
  let e = engine().await;
  for user in [alice(), bob(), UserId::guest()] {
    e.record_outcome(&user, "日", Outcome::Known, t0()).await.unwrap();
  }
  e.record_outcome(&alice(), "月", Outcome::Known, t0()).await.unwrap();

  e.delete_item("日").await.unwrap();

  for user in [alice(), bob(), UserId::guest()] {
    assert!(e.progress(&user, "日").await.unwrap().is_none());
  }
  assert!(e.progress(&alice(), "月").await.unwrap().is_some());

  // Re-adding the item starts everyone from scratch.
  e.add_item(Item::new("日", "sun")).await.unwrap();
  assert!(e.due_items(&bob(), t0()).await.unwrap().contains(&"日".to_owned()));
}

// ─── Bulk import ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn bulk_import_reports_each_record() {
  let e = engine().await;
  let report = e
    .bulk_import(
      r#"[
        {"id":"山","meaning":"mountain","primaryReadings":["サン"]},
        {"id":"日","meaning":"sun again"},
        {"meaning":"no identifier"}
      ]"#,
    )
    .await
    .unwrap();

  assert_eq!(report.added(), 1);
  assert_eq!(report.failed(), 2);
  assert!(matches!(&report.outcomes[0], ImportOutcome::Added { id } if id == "山"));
  assert!(matches!(&report.outcomes[1], ImportOutcome::Duplicate { id } if id == "日"));
  assert!(matches!(report.outcomes[2], ImportOutcome::Malformed { index: 2, .. }));

  assert_eq!(e.get_item("山").await.unwrap().primary_readings, ["サン"]);
  assert_eq!(e.get_item("日").await.unwrap().meaning, "sun");
}

#[tokio::test]
async fn bulk_import_accepts_a_single_legacy_object() {
  let e = engine().await;
  let report = e
    .bulk_import(
      r#"{"kanji":"川","meaning":"river","onyomi":["セン"],"kunyomi":["かわ"],
          "examples":[{"japanese":"小川","reading":"おがわ","english":"stream"}]}"#,
    )
    .await
    .unwrap();
  assert_eq!(report.added(), 1);

  let river = e.get_item("川").await.unwrap();
  assert_eq!(river.secondary_readings, ["かわ"]);
  assert_eq!(river.examples[0].translation, "stream");
}

#[tokio::test]
async fn bulk_import_of_non_json_is_malformed() {
  let e = engine().await;
  let err = e.bulk_import("not json at all").await.unwrap_err();
  assert!(matches!(err, CoreError::MalformedInput(_)));
  assert_eq!(e.list_items().await.unwrap().len(), 3);
}

#[tokio::test]
async fn import_value_uses_the_same_rules() {
  let e = engine().await;
  let report = e
    .import_value(serde_json::json!([{"id":"人","meaning":"person"},{"id":"人","meaning":"twice"}]))
    .await
    .unwrap();
  assert_eq!((report.added(), report.failed()), (1, 1));
}

// ─── Sessions & scores ───────────────────────────────────────────────────────

#[tokio::test]
async fn empty_session_scores_zero_percent() {
  let e = engine().await;
  let record = e
    .finalize_session(SessionTracker::new(), "practice", 0, t0())
    .await
    .unwrap();
  assert_eq!((record.correct, record.total, record.percentage), (0, 0, 0));
}

#[tokio::test]
async fn practice_session_is_persisted_with_percentage() {
  let e = engine().await;
  let mut tracker = SessionTracker::new();
  for correct in [true, false, true] {
    tracker.record(correct);
  }
  let record = e.finalize_session(tracker, "practice", 61, t0()).await.unwrap();
  assert_eq!(record.percentage, 67);
  assert_eq!(record.elapsed_seconds, 61);
  assert_eq!(e.score_history().await.unwrap(), [record]);
}

#[tokio::test]
async fn finalized_score_matches_history_entry() {
  let e = engine().await;
  let mut tracker = SessionTracker::new();
  tracker.record(true);
  let now = t0() + TimeDelta::microseconds(987_654);
  let record = e.finalize_session(tracker, "practice", 5, now).await.unwrap();
  assert_eq!(e.score_history().await.unwrap(), [record]);
}

#[tokio::test]
async fn score_history_is_most_recent_first() {
  let e = engine().await;
  for day in [2, 0, 5, 1] {
    let mut tracker = SessionTracker::new();
    tracker.record(true);
    e.finalize_session(tracker, &format!("day {day}"), 10, t0() + TimeDelta::days(day))
      .await
      .unwrap();
  }
  let kinds: Vec<String> = e.score_history().await.unwrap().into_iter().map(|s| s.test_kind).collect();
  assert_eq!(kinds, ["day 5", "day 2", "day 1", "day 0"]);
}

#[tokio::test]
async fn build_test_draws_only_due_items_when_asked() {
  let e = engine_with(catalog::builtin().unwrap()).await;
  let total = e.list_items().await.unwrap().len();
  let all_ids: Vec<String> = e.list_items().await.unwrap().into_iter().map(|i| i.id).collect();

  // Everything but two items is known and not yet due.
  for id in &all_ids[2..] {
    e.record_outcome(&alice(), id, Outcome::Known, t0()).await.unwrap();
  }

  let mut rng = StdRng::seed_from_u64(1);
  let plan = TestPlan { kind: TestKind::Meaning, question_count: 10, due_only: true };
  let questions = e.build_test(&alice(), &plan, t0(), &mut rng).await.unwrap();
  let mut ids: Vec<String> = questions.into_iter().map(|q| q.id).collect();
  ids.sort();
  let mut expected = all_ids[..2].to_vec();
  expected.sort();
  assert_eq!(ids, expected);

  let plan = TestPlan { due_only: false, ..plan };
  let questions = e.build_test(&alice(), &plan, t0(), &mut rng).await.unwrap();
  assert_eq!(questions.len(), 10.min(total));
}

#[tokio::test]
async fn build_test_rejects_unlisted_question_counts() {
  let e = engine().await;
  let mut rng = StdRng::seed_from_u64(1);
  let plan = TestPlan { question_count: 7, ..TestPlan::default() };
  let err = e.build_test(&alice(), &plan, t0(), &mut rng).await.unwrap_err();
  assert!(matches!(err, CoreError::MalformedInput(_)));
}

#[tokio::test]
async fn graded_test_is_capped_at_the_time_limit() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let e = Engine::new(Arc::new(store), small_catalog()).with_time_limit(Some(300));
  e.initialize().await.unwrap();

  let questions = e.list_items().await.unwrap();
  let answers: Vec<String> = questions.iter().map(|q| q.meaning.to_uppercase()).collect();
  let graded = grade_test(TestKind::Meaning, &questions, &answers);

  let record = e.finalize_test(graded, 1_000, t0()).await.unwrap();
  assert_eq!(record.elapsed_seconds, 300);
  assert_eq!(record.percentage, 100);
  assert_eq!(record.test_kind, TestKind::Meaning.label());
}

// ─── Preferences ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn preferences_default_then_persist() {
  let e = engine().await;
  assert_eq!(e.preferences().await.unwrap(), StudyPreferences::default());

  let prefs = StudyPreferences {
    front_fields: vec![CardField::Meaning],
    back_fields:  vec![CardField::Item, CardField::Examples],
    dark_mode:    true,
  };
  e.save_preferences(&prefs).await.unwrap();
  assert_eq!(e.preferences().await.unwrap(), prefs);
}

// ─── Opening from configuration ──────────────────────────────────────────────

#[tokio::test]
async fn open_seeds_once_and_survives_restart() {
  telemetry::init();
  let dir = TempDir::new().unwrap();
  let config = EngineConfig {
    store_path: dir.path().join("kado.db"),
    ..EngineConfig::default()
  };
  let builtin = catalog::builtin().unwrap().len();

  {
    let e = Engine::open(&config).await.unwrap();
    assert_eq!(e.list_items().await.unwrap().len(), builtin);
    e.record_outcome(&alice(), "日", Outcome::Known, t0()).await.unwrap();
    e.delete_item("年").await.unwrap();
  }

  let e = Engine::open(&config).await.unwrap();
  assert_eq!(e.initialize().await.unwrap(), 0);
  assert_eq!(e.list_items().await.unwrap().len(), builtin - 1);
  let record = e.progress(&alice(), "日").await.unwrap().unwrap();
  assert_eq!(record.mastery, Mastery::Known);
  assert_eq!(record.last_seen, Some(t0()));
}

#[tokio::test]
async fn open_with_custom_catalog_file() {
  let dir = TempDir::new().unwrap();
  let catalog_path = dir.path().join("catalog.json");
  std::fs::write(&catalog_path, r#"[{"id":"犬","meaning":"dog"},{"id":"猫","meaning":"cat"}]"#)
    .unwrap();

  let config = EngineConfig {
    store_path: dir.path().join("kado.db"),
    catalog_path: Some(catalog_path),
    ..EngineConfig::default()
  };
  let e = Engine::open(&config).await.unwrap();
  let ids: Vec<String> = e.list_items().await.unwrap().into_iter().map(|i| i.id).collect();
  assert_eq!(ids.len(), 2);
  assert!(ids.contains(&"犬".to_owned()));
}

#[tokio::test]
async fn open_in_missing_directory_is_storage_unavailable() {
  let dir = TempDir::new().unwrap();
  let config = EngineConfig {
    store_path: dir.path().join("no").join("such").join("kado.db"),
    ..EngineConfig::default()
  };
  let err = Engine::open(&config).await.err().expect("open must fail");
  assert!(matches!(err, kado_engine::Error::Core(CoreError::StorageUnavailable(_))));
}

#[test]
fn telemetry_init_is_idempotent() {
  telemetry::init();
  assert!(!telemetry::init());
}
