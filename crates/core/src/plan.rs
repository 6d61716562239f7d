//! Personalized study plan shapes.
//!
//! Plans only ever arrive from the enrichment payload. When a plan does not
//! fit [`PersonalizedPlan`] it is carried as [`PlanPayload::Opaque`] JSON so
//! material rewriting can still run over it.

use serde::{Deserialize, Serialize};

/// Learner progress trend across past tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressTrend {
    pub past_tests: u32,
    pub accuracy_growth_rate: f64,
    pub strong_skills: Vec<String>,
    pub weak_skills: Vec<String>,
    pub consistency_index: f64,
}

/// How fast the learner is progressing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSpeed {
    /// e.g. "steady", "accelerating", "declining", "plateau"
    pub category: String,
    pub description: String,
    pub trend: ProgressTrend,
    pub predicted_reach_next_level_weeks: u32,
    pub recommendation: String,
}

/// One week of the study plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyGoal {
    pub week: u32,
    pub topic: String,
    pub description: String,
    pub study_methods: Vec<String>,
    /// Always rewritten from the material catalog before a result is final.
    #[serde(default)]
    pub materials: Vec<String>,
    pub hours: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalizedPlan {
    pub progress_speed: ProgressSpeed,
    pub weekly_goals: Vec<WeeklyGoal>,
}

/// A plan as carried by a grading result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlanPayload {
    /// The plan matched the expected structure.
    Structured(PersonalizedPlan),
    /// The plan was kept as raw JSON.
    Opaque(serde_json::Value),
}

impl PlanPayload {
    pub fn is_structured(&self) -> bool {
        matches!(self, PlanPayload::Structured(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plan_json() -> serde_json::Value {
        json!({
            "progress_speed": {
                "category": "steady",
                "description": "Consistent gains",
                "trend": {
                    "past_tests": 3,
                    "accuracy_growth_rate": 4.5,
                    "strong_skills": ["Grammar"],
                    "weak_skills": ["Reading"],
                    "consistency_index": 0.8
                },
                "predicted_reach_next_level_weeks": 6,
                "recommendation": "Keep going"
            },
            "weekly_goals": [
                {"week": 1, "topic": "Reading inference", "description": "Practice",
                 "study_methods": ["drills"], "hours": 4}
            ]
        })
    }

    #[test]
    fn untagged_payload_prefers_structured() {
        let payload: PlanPayload = serde_json::from_value(plan_json()).unwrap();
        assert!(payload.is_structured());
        if let PlanPayload::Structured(plan) = payload {
            assert_eq!(plan.weekly_goals[0].week, 1);
            assert!(plan.weekly_goals[0].materials.is_empty());
        }
    }

    #[test]
    fn untagged_payload_falls_back_to_opaque() {
        let payload: PlanPayload =
            serde_json::from_value(json!({"weekly_goals": [{"topic": "Grammar"}]})).unwrap();
        assert!(!payload.is_structured());
    }
}
