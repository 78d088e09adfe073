//! Error type for `kado-engine` setup (configuration, catalog loading,
//! opening the store). Study operations return [`kado_core::Error`].

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("configuration error: {0}")]
  Config(#[from] ::config::ConfigError),

  #[error("cannot read catalog {path:?}: {source}")]
  Catalog {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error(transparent)]
  Core(#[from] kado_core::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
