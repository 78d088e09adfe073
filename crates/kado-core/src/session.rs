//! In-memory session statistics and timed tests.
//!
//! A [`SessionTracker`] lives only as long as the session. It is turned into
//! a [`NewScore`] by [`SessionTracker::finalize`]; dropping it instead simply
//! discards the session.

use chrono::{DateTime, SubsecRound as _, Utc};
use serde::{Deserialize, Serialize};

use crate::{answer::answers_match, item::Item, score::NewScore};

// ─── Tracker ─────────────────────────────────────────────────────────────────

/// Running counters for one practice or test session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTracker {
  reviewed:    u32,
  correct:     u32,
  streak:      u32,
  best_streak: u32,
}

impl SessionTracker {
  pub fn new() -> Self { Self::default() }

  /// Record one graded review.
  pub fn record(&mut self, correct: bool) {
    self.reviewed += 1;
    if correct {
      self.correct += 1;
      self.streak += 1;
      self.best_streak = self.best_streak.max(self.streak);
    } else {
      self.streak = 0;
    }
  }

  pub fn reviewed(&self) -> u32 { self.reviewed }

  pub fn correct(&self) -> u32 { self.correct }

  /// Consecutive correct answers ending at the latest review.
  pub fn streak(&self) -> u32 { self.streak }

  pub fn best_streak(&self) -> u32 { self.best_streak }

  pub fn percentage(&self) -> u8 { crate::score::percentage(self.correct, self.reviewed) }

  /// Close the session and produce the score to append to history.
  /// `recorded_at` keeps millisecond precision.
  pub fn finalize(
    self,
    test_kind: impl Into<String>,
    elapsed_seconds: u64,
    now: DateTime<Utc>,
  ) -> NewScore {
    NewScore {
      correct: self.correct,
      total: self.reviewed,
      elapsed_seconds,
      test_kind: test_kind.into(),
      recorded_at: now.trunc_subsecs(3),
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

/// What a test question shows and what it expects back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestKind {
  /// Show the item, expect its meaning.
  #[default]
  Meaning,
  /// Show the item, expect its primary readings.
  Reading,
  /// Show the meaning, expect the item.
  Reverse,
}

impl TestKind {
  pub const ALL: [TestKind; 3] = [Self::Meaning, Self::Reading, Self::Reverse];

  /// The label stored as the score's `test_kind`.
  pub fn label(self) -> &'static str {
    match self {
      Self::Meaning => "Item → Meaning",
      Self::Reading => "Item → Reading",
      Self::Reverse => "Meaning → Item",
    }
  }

  pub fn prompt(self, item: &Item) -> String {
    match self {
      Self::Meaning | Self::Reading => item.id.clone(),
      Self::Reverse => item.meaning.clone(),
    }
  }

  pub fn expected_answer(self, item: &Item) -> String {
    match self {
      Self::Meaning => item.meaning.clone(),
      Self::Reading => item.primary_reading_text(),
      Self::Reverse => item.id.clone(),
    }
  }
}

/// How to assemble a test from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestPlan {
  pub kind:           TestKind,
  /// Upper bound on the number of questions; fewer if the pool is smaller.
  pub question_count: usize,
  /// Draw only from items that are currently due for the user.
  pub due_only:       bool,
}

impl Default for TestPlan {
  fn default() -> Self {
    Self { kind: TestKind::default(), question_count: 10, due_only: false }
  }
}

/// The grading of a single question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResult {
  pub item_id:  String,
  pub prompt:   String,
  pub answer:   String,
  pub expected: String,
  pub correct:  bool,
}

/// A graded test, ready to be finalized into a score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedTest {
  pub kind:    TestKind,
  pub results: Vec<QuestionResult>,
  pub tracker: SessionTracker,
}

impl GradedTest {
  pub fn finalize(self, elapsed_seconds: u64, now: DateTime<Utc>) -> NewScore {
    self.tracker.finalize(self.kind.label(), elapsed_seconds, now)
  }
}

/// Grade `answers` against `questions` position by position. A question
/// without an answer is graded as an empty response.
pub fn grade_test(kind: TestKind, questions: &[Item], answers: &[String]) -> GradedTest {
  let mut tracker = SessionTracker::new();
  let results = questions
    .iter()
    .enumerate()
    .map(|(i, item)| {
      let answer = answers.get(i).map(String::as_str).unwrap_or_default();
      let expected = kind.expected_answer(item);
      let correct = answers_match(&expected, answer);
      tracker.record(correct);
      QuestionResult {
        item_id: item.id.clone(),
        prompt: kind.prompt(item),
        answer: answer.to_owned(),
        expected,
        correct,
      }
    })
    .collect();

  GradedTest { kind, results, tracker }
}
