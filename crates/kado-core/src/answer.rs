//! Free-text answer grading.
//!
//! Matching is intentionally lenient. Both sides are case-folded and trimmed,
//! then the answer is accepted when either string contains the other. A
//! partial answer ("su" for "sun") and an extended one ("japan, " for
//! "Japan") both pass. Only answers sharing no containment relation fail.

/// Case-fold and trim a string for comparison.
pub fn normalize(s: &str) -> String { s.trim().to_lowercase() }

/// Grade `given` against `expected` with bidirectional containment.
///
/// Symmetric in its arguments. Note that an empty answer is contained in
/// every expected value and is therefore accepted.
pub fn answers_match(expected: &str, given: &str) -> bool {
  let expected = normalize(expected);
  let given = normalize(given);
  expected.contains(&given) || given.contains(&expected)
}
