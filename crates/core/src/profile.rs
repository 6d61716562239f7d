//! Learner profile and the grade request envelope.
//!
//! Profiles are supplied by the caller (persistence is out of scope). The
//! grader only reads `current_level`; the rest is carried so callers can
//! forward it to the enrichment service.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::answer_key::{AnswerKeyEntry, RawAnswerSet};
use crate::error::{Error, Result};
use crate::outcome::PerQuestionOutcome;

/// One past test in the learner's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestHistoryItem {
    pub test_date: NaiveDate,
    pub level_at_test: String,
    #[serde(default)]
    pub per_question: Vec<PerQuestionOutcome>,
    #[serde(default)]
    pub weak_topics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerProfile {
    pub student_id: String,
    pub name: String,
    /// Level string, e.g. "TOEIC 605-780".
    pub current_level: String,
    #[serde(default)]
    pub study_hours_per_week: u32,
    #[serde(default)]
    pub learning_goals: String,
    #[serde(default)]
    pub learning_preferences: Vec<String>,
    #[serde(default)]
    pub study_methods: Vec<String>,
    /// Most recent first.
    #[serde(default)]
    pub test_history: Vec<TestHistoryItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_questions: Option<u32>,
}

/// A complete grading request as received at the service boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_info: Option<TestInfo>,

    pub answer_key: Vec<AnswerKeyEntry>,

    #[serde(default)]
    pub student_answers: RawAnswerSet,

    /// Whether the caller wants the result reconciled with enrichment.
    #[serde(default, alias = "use_gemini")]
    pub use_enrichment: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<LearnerProfile>,
}

impl GradeRequest {
    /// Check that question ids are unique within the answer key.
    pub fn validate(&self) -> Result<()> {
        let mut seen: std::collections::HashMap<i64, usize> = std::collections::HashMap::new();
        for (pos, entry) in self.answer_key.iter().enumerate() {
            if let Some(first) = seen.insert(entry.id, pos) {
                return Err(Error::DuplicateQuestionId {
                    id: entry.id,
                    first,
                    second: pos,
                });
            }
        }
        Ok(())
    }

    /// Parse and validate a request from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let request: Self = serde_json::from_str(text)?;
        request.validate()?;
        Ok(request)
    }

    /// The learner's current level, if a profile was supplied.
    pub fn profile_level(&self) -> Option<&str> {
        self.profile.as_ref().map(|p| p.current_level.as_str())
    }
}
