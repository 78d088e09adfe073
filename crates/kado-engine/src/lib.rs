//! The study engine: the operations a flashcard front end calls.
//!
//! [`Engine`] ties a [`kado_core::store::StudyStore`] to the pure scheduling
//! rules in `kado-core`. Every operation takes the user and, where time
//! matters, the current instant as explicit parameters; the engine keeps no
//! notion of a "current user" of its own.
//!
//! ```rust,ignore
//! let config = EngineConfig::load(Some(Path::new("kado.toml")))?;
//! let engine = Engine::open(&config).await?;
//! let due = engine.due_items(&UserId::guest(), Utc::now()).await?;
//! ```

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod telemetry;

pub use config::EngineConfig;
pub use engine::{CatalogEntry, Engine};
pub use error::{Error, Result};
