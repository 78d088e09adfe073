//! Error taxonomy shared by every Kado crate.
//!
//! Storage backends keep their own error enums and convert into this one, so
//! callers can tell a duplicate key from a missing record from a dead disk
//! without knowing which backend is in use.

use thiserror::Error;

/// The named record collection an error refers to.
pub type Collection = &'static str;

pub const ITEMS: Collection = "items";
pub const PROGRESS: Collection = "progress";
pub const SCORES: Collection = "scores";
pub const SETTINGS: Collection = "settings";

#[derive(Debug, Error)]
pub enum Error {
  /// Insert of a primary key that is already present.
  #[error("duplicate key in {collection}: {key}")]
  DuplicateKey { collection: Collection, key: String },

  /// Lookup, update or delete of a key that does not exist.
  #[error("not found in {collection}: {key}")]
  NotFound { collection: Collection, key: String },

  /// A payload that does not match the expected record shape.
  #[error("malformed input: {0}")]
  MalformedInput(String),

  /// The durable storage could not be opened or initialised.
  #[error("storage unavailable: {0}")]
  StorageUnavailable(String),

  /// Any other backend failure.
  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub fn duplicate(collection: Collection, key: impl Into<String>) -> Self {
    Self::DuplicateKey { collection, key: key.into() }
  }

  pub fn not_found(collection: Collection, key: impl Into<String>) -> Self {
    Self::NotFound { collection, key: key.into() }
  }

  pub fn is_duplicate_key(&self) -> bool { matches!(self, Self::DuplicateKey { .. }) }

  pub fn is_not_found(&self) -> bool { matches!(self, Self::NotFound { .. }) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
