//! The final grading result and the deterministic baseline it starts from.

use serde::{Deserialize, Serialize};

use crate::outcome::{PerQuestionOutcome, SkillAggregate};
use crate::plan::PlanPayload;

/// Level string used when no level is known.
pub const UNKNOWN_LEVEL: &str = "Unknown";

/// Output of local grading: everything computable from the answer key and
/// the learner's answers alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineGrade {
    pub total_score: u32,
    pub total_questions: u32,
    pub per_question: Vec<PerQuestionOutcome>,
    pub skill_summary: Vec<SkillAggregate>,
    pub weak_topics: Vec<String>,
}

/// The result returned for one grading request.
///
/// Serializes to a JSON object whose keys are exactly the field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingResult {
    pub total_score: u32,
    pub total_questions: u32,
    pub per_question: Vec<PerQuestionOutcome>,
    pub skill_summary: Vec<SkillAggregate>,
    pub weak_topics: Vec<String>,
    pub recommendations: Option<Vec<String>>,
    pub personalized_plan: Option<PlanPayload>,
    pub current_level: String,
    pub post_test_level: String,
}

impl GradingResult {
    /// Wrap a baseline grade into a full result.
    ///
    /// `current_level` comes from the learner profile when one is known;
    /// `post_test_level` is only ever supplied by enrichment.
    pub fn baseline(grade: BaselineGrade, current_level: Option<&str>) -> Self {
        Self {
            total_score: grade.total_score,
            total_questions: grade.total_questions,
            per_question: grade.per_question,
            skill_summary: grade.skill_summary,
            weak_topics: grade.weak_topics,
            recommendations: None,
            personalized_plan: None,
            current_level: current_level.unwrap_or(UNKNOWN_LEVEL).to_string(),
            post_test_level: UNKNOWN_LEVEL.to_string(),
        }
    }

    /// Whether `total_score` equals the number of correct outcomes.
    pub fn score_matches_outcomes(&self) -> bool {
        let correct = self.per_question.iter().filter(|o| o.correct).count();
        usize::try_from(self.total_score).is_ok_and(|score| score == correct)
    }
}
