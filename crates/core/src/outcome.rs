//! Per-question outcomes and per-skill aggregates.

use serde::{Deserialize, Deserializer, Serialize};

/// The graded outcome of one answer-key entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerQuestionOutcome {
    /// Accepts a quoted integer such as `"3"`.
    #[serde(deserialize_with = "lenient_id")]
    pub id: i64,

    #[serde(default)]
    pub question: Option<String>,

    pub correct: bool,

    /// Expected answer, trimmed and upper-cased.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub expected_answer: String,

    /// Learner answer, trimmed and upper-cased; `None` when unanswered.
    #[serde(default)]
    pub user_answer: Option<String>,

    #[serde(default)]
    pub skill: Option<String>,

    #[serde(default)]
    pub topic: Option<String>,

    /// Human-readable explanation. Enrichment payloads use `explain`.
    #[serde(default, alias = "explain", deserialize_with = "null_as_empty")]
    pub explanation: String,
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid question id {text:?}"))),
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accuracy statistics for one skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillAggregate {
    pub skill: String,
    pub total: u32,
    pub correct: u32,
    /// Percentage in `[0, 100]`, rounded to two decimals.
    pub accuracy: f64,
}

impl SkillAggregate {
    /// Build an aggregate, computing the rounded accuracy.
    ///
    /// A skill with no questions has accuracy `0.0`.
    pub fn new(skill: impl Into<String>, total: u32, correct: u32) -> Self {
        let accuracy = if total == 0 {
            0.0
        } else {
            round2(f64::from(correct) / f64::from(total) * 100.0)
        };
        Self {
            skill: skill.into(),
            total,
            correct,
            accuracy,
        }
    }
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_is_rounded() {
        let agg = SkillAggregate::new("Grammar", 3, 1);
        assert_eq!(agg.accuracy, 33.33);
        let agg = SkillAggregate::new("Grammar", 3, 2);
        assert_eq!(agg.accuracy, 66.67);
    }

    #[test]
    fn zero_total_has_zero_accuracy() {
        let agg = SkillAggregate::new("Listening", 0, 0);
        assert_eq!(agg.accuracy, 0.0);
    }

    #[test]
    fn outcome_accepts_explain_alias_and_nulls() {
        let json = serde_json::json!({
            "id": 2,
            "question": null,
            "correct": false,
            "expected_answer": "B",
            "user_answer": null,
            "skill": "Reading",
            "topic": "Inference",
            "explain": "The passage implies B."
        });
        let outcome: PerQuestionOutcome = serde_json::from_value(json).unwrap();
        assert_eq!(outcome.explanation, "The passage implies B.");
        assert!(outcome.user_answer.is_none());

        let json = serde_json::json!({"id": 1, "correct": true, "explain": null});
        let outcome: PerQuestionOutcome = serde_json::from_value(json).unwrap();
        assert_eq!(outcome.explanation, "");
        assert_eq!(outcome.expected_answer, "");
    }

    #[test]
    fn outcome_accepts_quoted_id() {
        let json = serde_json::json!({"id": " 12", "correct": true});
        let outcome: PerQuestionOutcome = serde_json::from_value(json).unwrap();
        assert_eq!(outcome.id, 12);

        let json = serde_json::json!({"id": "twelve", "correct": true});
        let err = serde_json::from_value::<PerQuestionOutcome>(json).unwrap_err();
        assert!(err.to_string().contains("invalid question id"));
    }

    #[test]
    fn outcome_serializes_explanation_and_null_answer() {
        let outcome = PerQuestionOutcome {
            id: 1,
            question: None,
            correct: false,
            expected_answer: "A".into(),
            user_answer: None,
            skill: None,
            topic: None,
            explanation: "Expected \"A\" but got \"no answer\".".into(),
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert!(value.get("explanation").is_some());
        assert!(value.get("explain").is_none());
        assert!(value["user_answer"].is_null());
    }
}
