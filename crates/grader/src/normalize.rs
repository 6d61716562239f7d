//! Canonical comparison form for expected and learner answers.

use lexigrade_core::{AnswerId, AnswerKeyEntry, RawAnswerSet};

/// An answer-key entry resolved against the learner's answers.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAnswer<'a> {
    /// Expected answer in canonical form.
    pub expected: String,
    /// Learner answer in canonical form; `None` when unanswered.
    pub user_answer: Option<String>,
    /// The learner's answer exactly as submitted.
    pub raw_answer: Option<&'a str>,
}

impl NormalizedAnswer<'_> {
    /// Unanswered is always incorrect.
    pub fn is_correct(&self) -> bool {
        self.user_answer.as_deref() == Some(self.expected.as_str())
    }
}

/// Trim and upper-case.
pub fn normalize_answer(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Find the learner's answer for a question id, trying the numeric form
/// first and its string form second.
pub fn resolve_answer(id: i64, answers: &RawAnswerSet) -> Option<&str> {
    let given = AnswerId::Number(id);
    answers
        .get(&given)
        .or_else(|| given.alternate().and_then(|alt| answers.get(&alt)))
}

/// Resolve and normalize one entry. Blank answers count as unanswered.
pub fn normalize_entry<'a>(entry: &AnswerKeyEntry, answers: &'a RawAnswerSet) -> NormalizedAnswer<'a> {
    let raw_answer = resolve_answer(entry.id, answers).filter(|a| !a.trim().is_empty());
    NormalizedAnswer {
        expected: normalize_answer(&entry.answer),
        user_answer: raw_answer.map(normalize_answer),
        raw_answer,
    }
}
