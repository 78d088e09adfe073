//! Error type for `kado-store-sqlite`.

use kado_core::error::Collection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] kado_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored column held a value outside the domain type's range.
  #[error("decode error: {0}")]
  Decode(String),

  /// The database file could not be opened or its schema initialised.
  #[error("cannot open store: {0}")]
  Unavailable(String),

  #[error("duplicate key in {collection}: {key}")]
  DuplicateKey { collection: Collection, key: String },

  #[error("not found in {collection}: {key}")]
  NotFound { collection: Collection, key: String },
}

impl From<Error> for kado_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(inner) => inner,
      Error::Json(inner) => Self::Serialization(inner),
      Error::Unavailable(msg) => Self::StorageUnavailable(msg),
      Error::DuplicateKey { collection, key } => Self::DuplicateKey { collection, key },
      Error::NotFound { collection, key } => Self::NotFound { collection, key },
      other => Self::Storage(Box::new(other)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
