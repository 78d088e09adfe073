//! [`SqliteStore`]: the SQLite implementation of [`StudyStore`].

use std::path::Path;

use chrono::SubsecRound as _;
use kado_core::{
  error::ITEMS,
  item::Item,
  progress::ProgressRecord,
  score::{NewScore, ScoreRecord},
  settings::Setting,
  store::StudyStore,
  user::UserId,
};
use rusqlite::{OptionalExtension as _, TransactionBehavior};

use crate::{
  encode::{
    EncodedItem, ITEM_COLUMNS, PROGRESS_COLUMNS, RawItem, RawProgress, RawScore, RawSetting,
    SCORE_COLUMNS, encode_dt, encode_mastery,
  },
  schema::{MIGRATIONS, PRAGMAS, SCHEMA_VERSION},
  Error, Result,
};

/// Whether a rusqlite error is a uniqueness/primary-key violation.
fn is_constraint_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(err, _)
      if err.code == rusqlite::ErrorCode::ConstraintViolation
  )
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Kado study store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and bring its schema up to date.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    let conn = tokio_rusqlite::Connection::open(&path).await;
    Self::initialised(conn, &path.display().to_string()).await
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await;
    Self::initialised(conn, ":memory:").await
  }

  /// Any failure to open `conn` or initialise its schema is `Unavailable`.
  async fn initialised(
    conn: tokio_rusqlite::Result<tokio_rusqlite::Connection>,
    name: &str,
  ) -> Result<Self> {
    let unavailable = |e: &dyn std::fmt::Display| Error::Unavailable(format!("{name}: {e}"));
    let store = Self { conn: conn.map_err(|e| unavailable(&e))? };
    store.init_schema().await.map_err(|e| unavailable(&e))?;
    Ok(store)
  }

  /// Apply any migration steps newer than the stored `user_version`.
  ///
  /// Safe to call repeatedly: an up-to-date database is left untouched.
  async fn init_schema(&self) -> Result<()> {
    let (from, to) = self
      .conn
      .call(|conn| {
        conn.execute_batch(PRAGMAS)?;

        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current: i64 = tx.query_row("PRAGMA user_version", [], |r| r.get(0))?;
        if current >= SCHEMA_VERSION {
          return Ok((current, current));
        }
        for step in MIGRATIONS.iter().skip(current.max(0) as usize) {
          tx.execute_batch(step)?;
        }
        tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        tx.commit()?;
        Ok((current, SCHEMA_VERSION))
      })
      .await?;

    if from != to {
      tracing::info!(from, to, "upgraded study store schema");
    }
    Ok(())
  }

  /// The schema version recorded in the database.
  pub async fn schema_version(&self) -> Result<i64> {
    let version = self
      .conn
      .call(|conn| Ok(conn.query_row("PRAGMA user_version", [], |r| r.get(0))?))
      .await?;
    Ok(version)
  }
}

// ─── StudyStore impl ─────────────────────────────────────────────────────────

impl StudyStore for SqliteStore {
  type Error = Error;

  // ── Items ─────────────────────────────────────────────────────────────────

  async fn get_item<'a>(&'a self, id: &'a str) -> Result<Option<Item>> {
    let id = id.to_owned();

    let raw: Option<RawItem> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {ITEM_COLUMNS} FROM items WHERE item_id = ?1"),
            rusqlite::params![id],
            RawItem::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawItem::into_item).transpose()
  }

  async fn list_items(&self) -> Result<Vec<Item>> {
    let raws: Vec<RawItem> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY item_id"))?;
        let rows = stmt
          .query_map([], RawItem::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawItem::into_item).collect()
  }

  async fn count_items(&self) -> Result<usize> {
    let count: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM items", [], |r| r.get(0))?))
      .await?;
    Ok(count.max(0) as usize)
  }

  async fn add_item<'a>(&'a self, item: &'a Item) -> Result<()> {
    let row = EncodedItem::new(item)?;

    let inserted = self
      .conn
      .call(move |conn| {
        let res = conn.execute(
          &format!("INSERT INTO items ({ITEM_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
          rusqlite::params![
            row.item_id,
            row.meaning,
            row.primary_readings,
            row.secondary_readings,
            row.examples,
          ],
        );
        match res {
          Ok(_) => Ok(true),
          Err(e) if is_constraint_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      return Err(Error::DuplicateKey { collection: ITEMS, key: item.id.clone() });
    }
    Ok(())
  }

  async fn put_item<'a>(&'a self, item: &'a Item) -> Result<()> {
    let row = EncodedItem::new(item)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO items ({ITEM_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(item_id) DO UPDATE SET
               meaning            = excluded.meaning,
               primary_readings   = excluded.primary_readings,
               secondary_readings = excluded.secondary_readings,
               examples           = excluded.examples"
          ),
          rusqlite::params![
            row.item_id,
            row.meaning,
            row.primary_readings,
            row.secondary_readings,
            row.examples,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_item<'a>(&'a self, id: &'a str) -> Result<()> {
    let id_owned = id.to_owned();

    // `None` when the item did not exist, otherwise the number of progress
    // rows removed alongside it.
    let removed: Option<usize> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let items = tx.execute("DELETE FROM items WHERE item_id = ?1", rusqlite::params![id_owned])?;
        if items == 0 {
          return Ok(None);
        }
        let progress =
          tx.execute("DELETE FROM progress WHERE item_id = ?1", rusqlite::params![id_owned])?;
        tx.commit()?;
        Ok(Some(progress))
      })
      .await?;

    match removed {
      None => Err(Error::NotFound { collection: ITEMS, key: id.to_owned() }),
      Some(progress) => {
        tracing::debug!(item = id, progress, "deleted item and its progress");
        Ok(())
      }
    }
  }

  async fn seed_items<'a>(&'a self, items: &'a [Item]) -> Result<usize> {
    let rows = items.iter().map(EncodedItem::new).collect::<Result<Vec<_>>>()?;

    let inserted = self
      .conn
      .call(move |conn| {
        // IMMEDIATE takes the write lock before the count, so two seeders
        // cannot both observe an empty catalog.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let count: i64 = tx.query_row("SELECT COUNT(*) FROM items", [], |r| r.get(0))?;
        if count > 0 {
          return Ok(0);
        }

        let mut inserted = 0;
        {
          let mut stmt = tx.prepare(&format!(
            "INSERT OR IGNORE INTO items ({ITEM_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"
          ))?;
          for row in &rows {
            inserted += stmt.execute(rusqlite::params![
              row.item_id,
              row.meaning,
              row.primary_readings,
              row.secondary_readings,
              row.examples,
            ])?;
          }
        }
        tx.commit()?;
        Ok(inserted)
      })
      .await?;

    if inserted > 0 {
      tracing::info!(inserted, "seeded item catalog");
    }
    Ok(inserted)
  }

  // ── Progress ──────────────────────────────────────────────────────────────

  async fn get_progress<'a>(
    &'a self,
    user_id: &'a UserId,
    item_id: &'a str,
  ) -> Result<Option<ProgressRecord>> {
    let user = user_id.as_str().to_owned();
    let item = item_id.to_owned();

    let raw: Option<RawProgress> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {PROGRESS_COLUMNS} FROM progress WHERE user_id = ?1 AND item_id = ?2"
            ),
            rusqlite::params![user, item],
            RawProgress::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawProgress::into_record).transpose()
  }

  async fn list_progress<'a>(&'a self, user_id: &'a UserId) -> Result<Vec<ProgressRecord>> {
    let user = user_id.as_str().to_owned();

    let raws: Vec<RawProgress> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PROGRESS_COLUMNS} FROM progress WHERE user_id = ?1 ORDER BY item_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user], RawProgress::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProgress::into_record).collect()
  }

  async fn list_all_progress(&self) -> Result<Vec<ProgressRecord>> {
    let raws: Vec<RawProgress> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PROGRESS_COLUMNS} FROM progress ORDER BY user_id, item_id"
        ))?;
        let rows = stmt
          .query_map([], RawProgress::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProgress::into_record).collect()
  }

  async fn put_progress<'a>(&'a self, record: &'a ProgressRecord) -> Result<()> {
    let user      = record.user_id.as_str().to_owned();
    let item      = record.item_id.clone();
    let mastery   = encode_mastery(record.mastery);
    let interval  = i64::from(record.interval_days);
    let last_seen = record.last_seen.map(encode_dt);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO progress ({PROGRESS_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(user_id, item_id) DO UPDATE SET
               mastery       = excluded.mastery,
               interval_days = excluded.interval_days,
               last_seen     = excluded.last_seen"
          ),
          rusqlite::params![user, item, mastery, interval, last_seen],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Scores (append-only) ──────────────────────────────────────────────────

  async fn add_score(&self, score: NewScore) -> Result<ScoreRecord> {
    score.validate()?;

    let percentage  = score.percentage();
    let recorded_at = score.recorded_at.trunc_subsecs(3);
    let encoded_at  = encode_dt(recorded_at);
    let elapsed     = i64::try_from(score.elapsed_seconds).map_err(|_| {
      Error::Decode(format!("elapsed_seconds out of range: {}", score.elapsed_seconds))
    })?;
    let (correct, total) = (i64::from(score.correct), i64::from(score.total));
    let test_kind = score.test_kind.clone();

    let score_id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO scores (correct, total, percentage, elapsed_seconds, test_kind, recorded_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![correct, total, percentage, elapsed, test_kind, encoded_at],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(ScoreRecord {
      score_id,
      correct: score.correct,
      total: score.total,
      percentage,
      elapsed_seconds: score.elapsed_seconds,
      test_kind: score.test_kind,
      recorded_at,
    })
  }

  async fn list_scores(&self) -> Result<Vec<ScoreRecord>> {
    let raws: Vec<RawScore> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SCORE_COLUMNS} FROM scores ORDER BY recorded_at DESC, score_id DESC"
        ))?;
        let rows = stmt
          .query_map([], RawScore::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawScore::into_score).collect()
  }

  // ── Settings ──────────────────────────────────────────────────────────────

  async fn get_setting<'a>(&'a self, key: &'a str) -> Result<Option<Setting>> {
    let key = key.to_owned();

    let raw: Option<RawSetting> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT key, value_json FROM settings WHERE key = ?1",
            rusqlite::params![key],
            RawSetting::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSetting::into_setting).transpose()
  }

  async fn put_setting<'a>(&'a self, setting: &'a Setting) -> Result<()> {
    let key        = setting.key.clone();
    let value_json = serde_json::to_string(&setting.value)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO settings (key, value_json) VALUES (?1, ?2)
           ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
          rusqlite::params![key, value_json],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_settings(&self) -> Result<Vec<Setting>> {
    let raws: Vec<RawSetting> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT key, value_json FROM settings ORDER BY key")?;
        let rows = stmt
          .query_map([], RawSetting::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSetting::into_setting).collect()
  }
}
