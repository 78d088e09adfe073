//! User identity as supplied by the (external) auth collaborator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The literal identifier used when nobody is signed in.
pub const GUEST: &str = "guest";

/// An opaque user identifier: an email address or [`GUEST`].
///
/// Progress is partitioned by this value and nothing else. The guest
/// identity is stored exactly like any other; callers may warn that guest
/// progress is not tied to an account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn guest() -> Self { Self(GUEST.to_owned()) }

  /// Map the auth layer's "current user" capability to an identity.
  /// Absence or a blank identifier falls back to the guest identity.
  pub fn from_current(current: Option<&str>) -> Self {
    match current.map(str::trim) {
      Some(id) if !id.is_empty() => Self(id.to_owned()),
      _ => Self::guest(),
    }
  }

  pub fn is_guest(&self) -> bool { self.0 == GUEST }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for UserId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for UserId {
  fn from(s: &str) -> Self { Self::new(s) }
}

impl From<String> for UserId {
  fn from(s: String) -> Self { Self(s) }
}
