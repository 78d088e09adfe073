//! Bulk import payload validation and per-record outcome reporting.
//!
//! A payload is a JSON array of items or a single item object. Every element
//! is validated on its own, so one bad record never hides the others. Only a
//! payload that is not JSON (or is neither an array nor an object) fails the
//! whole call.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result, item::Item};

/// One element of a bulk payload after structural validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
  Valid(Item),
  Malformed {
    index:  usize,
    /// The element's identifier if one could be read.
    id:     Option<String>,
    reason: String,
  },
}

/// Split a bulk payload into validated candidates, preserving order.
pub fn parse_payload(payload: &str) -> Result<Vec<Candidate>> {
  let value: Value = serde_json::from_str(payload)
    .map_err(|e| Error::MalformedInput(format!("payload is not valid JSON: {e}")))?;
  candidates(value)
}

/// As [`parse_payload`] for an already-parsed JSON value.
pub fn candidates(value: Value) -> Result<Vec<Candidate>> {
  let elements = match value {
    Value::Array(elements) => elements,
    obj @ Value::Object(_) => vec![obj],
    other => {
      return Err(Error::MalformedInput(format!(
        "expected an item object or an array of items, got {}",
        kind_of(&other)
      )));
    }
  };

  Ok(elements.into_iter().enumerate().map(|(i, v)| candidate(i, v)).collect())
}

fn candidate(index: usize, value: Value) -> Candidate {
  let id = ["id", "kanji"]
    .iter()
    .find_map(|k| value.get(k).and_then(Value::as_str))
    .map(str::to_owned);

  let parsed = serde_json::from_value::<Item>(value)
    .map_err(|e| Error::MalformedInput(e.to_string()))
    .and_then(|item| item.validate().map(|()| item));

  match parsed {
    Ok(item) => Candidate::Valid(item),
    Err(e) => Candidate::Malformed { index, id, reason: e.to_string() },
  }
}

fn kind_of(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}

// ─── Report ──────────────────────────────────────────────────────────────────

/// What happened to one element of a bulk import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImportOutcome {
  Added {
    id: String,
  },
  /// An item with this identifier already exists; it was left untouched.
  Duplicate {
    id: String,
  },
  Malformed {
    index:  usize,
    id:     Option<String>,
    reason: String,
  },
  /// The store rejected the insert for another reason.
  Failed {
    id:     String,
    reason: String,
  },
}

impl ImportOutcome {
  pub fn is_success(&self) -> bool { matches!(self, Self::Added { .. }) }
}

/// Per-element outcomes of a bulk import, in payload order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
  pub outcomes: Vec<ImportOutcome>,
}

impl ImportReport {
  pub fn added(&self) -> usize { self.outcomes.iter().filter(|o| o.is_success()).count() }

  pub fn failed(&self) -> usize { self.outcomes.len() - self.added() }
}
