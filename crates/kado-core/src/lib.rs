//! Core types and trait definitions for the Kado study engine.
//!
//! This crate is deliberately free of database dependencies. It owns the
//! domain model, the pure scheduling rules, and the [`store::StudyStore`]
//! abstraction that storage backends implement.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod answer;
pub mod error;
pub mod import;
pub mod item;
pub mod progress;
pub mod scheduler;
pub mod score;
pub mod session;
pub mod settings;
pub mod store;
pub mod user;

pub use error::{Error, Result};
