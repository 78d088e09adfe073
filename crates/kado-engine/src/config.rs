//! Engine configuration.
//!
//! Loaded with the `config` crate from an optional TOML file, overridden by
//! `KADO_*` environment variables (e.g. `KADO_STORE_PATH`,
//! `KADO_SEED_ON_OPEN=false`, `KADO_QUESTION_COUNTS=5,10`).
//!
//! ```toml
//! store_path           = "~/.local/share/kado/kado.db"
//! seed_on_open         = true
//! catalog_path         = "n5.json"   # omit to use the bundled catalog
//! question_counts      = [10, 20, 50]
//! test_time_limit_secs = 300
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Runtime configuration for [`crate::Engine::open`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
  /// SQLite database file. A leading `~/` expands to `$HOME`.
  pub store_path:           PathBuf,
  /// Seed the item catalog when the store is opened and empty.
  pub seed_on_open:         bool,
  /// JSON catalog to seed from instead of the bundled one.
  #[serde(default)]
  pub catalog_path:         Option<PathBuf>,
  /// Test lengths a caller may request.
  pub question_counts:      Vec<usize>,
  /// Upper bound on the elapsed time recorded for a timed test.
  #[serde(default)]
  pub test_time_limit_secs: Option<u64>,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      store_path:           PathBuf::from("kado.db"),
      seed_on_open:         true,
      catalog_path:         None,
      question_counts:      vec![10, 20, 50],
      test_time_limit_secs: Some(300),
    }
  }
}

impl EngineConfig {
  /// Layer defaults, the optional file at `path`, and the environment.
  pub fn load(path: Option<&Path>) -> Result<Self> { Self::load_from(path, environment()) }

  fn load_from(path: Option<&Path>, env: ::config::Environment) -> Result<Self> {
    let mut builder = ::config::Config::builder()
      .set_default("store_path", "kado.db")?
      .set_default("seed_on_open", true)?
      .set_default("question_counts", vec![10_i64, 20, 50])?
      .set_default("test_time_limit_secs", 300_i64)?;

    if let Some(path) = path {
      builder = builder.add_source(::config::File::from(path).required(false));
    }

    let settings = builder
      .add_source(env)
      .build()?;

    Ok(settings.try_deserialize()?)
  }

  /// `store_path` with a leading `~` expanded.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// `KADO_*` variables. Values are parsed as numbers or booleans where they
/// look like one; `question_counts` is a comma-separated list.
fn environment() -> ::config::Environment {
  ::config::Environment::with_prefix("KADO")
    .try_parsing(true)
    .list_separator(",")
    .with_list_parse_key("question_counts")
}

/// Replace a leading `~` component with `$HOME`. Paths without one, or a
/// missing `$HOME`, pass through unchanged.
fn expand_tilde(path: &Path) -> PathBuf {
  match (path.strip_prefix("~"), std::env::var_os("HOME")) {
    (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
    _ => path.to_path_buf(),
  }
}
