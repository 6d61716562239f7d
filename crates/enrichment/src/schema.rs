//! Gating recovered JSON into a typed enrichment payload.
//!
//! Only the two mandatory keys can reject a payload. Every optional field
//! is checked on its own; a malformed one is dropped (or, for the plan,
//! kept as opaque JSON) and recorded in [`EnrichmentPayload::degraded`].

use lexigrade_core::{PerQuestionOutcome, PersonalizedPlan, PlanPayload, SkillAggregate};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{EnrichmentError, EnrichmentResult};

/// Keys a payload must carry to be usable at all.
pub const MANDATORY_KEYS: [&str; 2] = ["total_score", "per_question"];

/// A schema-approved enrichment payload.
///
/// Optional fields are `None` when absent, `null`, or malformed.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentPayload {
    pub total_score: u32,
    pub per_question: Vec<PerQuestionOutcome>,
    pub total_questions: Option<u32>,
    pub skill_summary: Option<Vec<SkillAggregate>>,
    pub weak_topics: Option<Vec<String>>,
    pub recommendations: Option<Vec<String>>,
    pub personalized_plan: Option<PlanPayload>,
    pub current_level: Option<String>,
    pub post_test_level: Option<String>,
    /// Structural problems found in optional fields.
    pub degraded: Vec<EnrichmentError>,
}

/// Validates untrusted JSON against the enrichment schema.
pub struct SchemaGate;

impl SchemaGate {
    /// Whether `value` is an object carrying every mandatory key.
    pub fn is_candidate(value: &Value) -> bool {
        value
            .as_object()
            .is_some_and(|map| MANDATORY_KEYS.iter().all(|key| map.contains_key(*key)))
    }

    /// Validate `value` and convert it into an [`EnrichmentPayload`].
    pub fn validate(value: Value) -> EnrichmentResult<EnrichmentPayload> {
        let mut map = match value {
            Value::Object(map) => map,
            other => {
                return Err(reject(
                    format!("payload is a JSON {}, not an object", kind(&other)),
                    Vec::new(),
                ));
            }
        };

        let keys: Vec<String> = map.keys().cloned().collect();
        let missing: Vec<&str> = MANDATORY_KEYS
            .iter()
            .copied()
            .filter(|key| !map.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return Err(reject(
                format!("missing mandatory key(s): {}", missing.join(", ")),
                keys,
            ));
        }

        let total_score = map
            .get("total_score")
            .and_then(as_count)
            .ok_or_else(|| reject("total_score must be a non-negative integer".into(), keys.clone()))?;
        let per_question = per_question(map.remove("per_question"), &keys)?;

        let mut degraded = Vec::new();
        let payload = EnrichmentPayload {
            total_score,
            per_question,
            total_questions: optional(&mut map, "total_questions", &mut degraded, |v| {
                as_count(&v).ok_or_else(|| "expected a non-negative integer".to_string())
            }),
            skill_summary: optional(&mut map, "skill_summary", &mut degraded, skill_summary),
            weak_topics: optional(&mut map, "weak_topics", &mut degraded, string_list),
            recommendations: optional(&mut map, "recommendations", &mut degraded, string_list),
            personalized_plan: plan(map.remove("personalized_plan"), &mut degraded),
            current_level: optional(&mut map, "current_level", &mut degraded, level),
            post_test_level: optional(&mut map, "post_test_level", &mut degraded, level),
            degraded,
        };

        for problem in &payload.degraded {
            warn!(%problem, "Degraded optional enrichment field");
        }
        debug!(
            total_score = payload.total_score,
            questions = payload.per_question.len(),
            degraded = payload.degraded.len(),
            "Enrichment payload accepted"
        );
        Ok(payload)
    }
}

fn reject(reason: String, keys: Vec<String>) -> EnrichmentError {
    warn!(%reason, ?keys, "Enrichment payload rejected");
    EnrichmentError::Schema { reason, keys }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Non-negative integer that fits `u32`. Integral floats such as `7.0` and
/// numeric strings such as `"7"` count.
fn as_count(value: &Value) -> Option<u32> {
    if let Value::String(text) = value {
        return text.trim().parse().ok();
    }
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).ok();
    }
    let f = value.as_f64()?;
    (f.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&f)).then_some(f as u32)
}

fn per_question(value: Option<Value>, keys: &[String]) -> EnrichmentResult<Vec<PerQuestionOutcome>> {
    let Some(Value::Array(items)) = value else {
        return Err(reject("per_question must be an array".into(), keys.to_vec()));
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value(item)
                .map_err(|e| reject(format!("per_question[{i}] is malformed: {e}"), keys.to_vec()))
        })
        .collect()
}

/// Take an optional field, treating `null` as absent. A conversion failure
/// is recorded as structural degradation and the field is dropped.
fn optional<T>(
    map: &mut Map<String, Value>,
    field: &str,
    degraded: &mut Vec<EnrichmentError>,
    convert: impl FnOnce(Value) -> Result<T, String>,
) -> Option<T> {
    let value = map.remove(field).filter(|v| !v.is_null())?;
    match convert(value) {
        Ok(converted) => Some(converted),
        Err(reason) => {
            degraded.push(EnrichmentError::Structural {
                field: field.to_string(),
                reason,
            });
            None
        }
    }
}

fn skill_summary(value: Value) -> Result<Vec<SkillAggregate>, String> {
    let items = match value {
        Value::Array(items) => items,
        other => return Err(format!("expected an array, found {}", kind(&other))),
    };
    let count = items.len();
    let valid: Vec<SkillAggregate> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<SkillAggregate>(item).ok())
        .filter(|agg| {
            agg.correct <= agg.total && agg.accuracy.is_finite() && (0.0..=100.0).contains(&agg.accuracy)
        })
        .collect();
    if count > 0 && valid.is_empty() {
        return Err(format!("none of the {count} entries is a valid skill aggregate"));
    }
    if valid.len() < count {
        debug!(skipped = count - valid.len(), "Skipped malformed skill_summary entries");
    }
    Ok(valid)
}

fn string_list(value: Value) -> Result<Vec<String>, String> {
    let items = match value {
        Value::Array(items) => items,
        other => return Err(format!("expected an array of strings, found {}", kind(&other))),
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s),
            _ => None,
        })
        .collect())
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    }
}

fn level(value: Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(format!("expected a string, found {}", kind(&other))),
    }
}

/// `null`, `{}`, `[]` and `""` all mean no plan.
fn plan(value: Option<Value>, degraded: &mut Vec<EnrichmentError>) -> Option<PlanPayload> {
    let value = value.filter(|v| !is_blank(v))?;
    match serde_json::from_value::<PersonalizedPlan>(value.clone()) {
        Ok(plan) => Some(PlanPayload::Structured(plan)),
        Err(e) => {
            degraded.push(EnrichmentError::Structural {
                field: "personalized_plan".into(),
                reason: format!("kept as opaque data: {e}"),
            });
            Some(PlanPayload::Opaque(value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outcome(id: i64, correct: bool) -> Value {
        json!({
            "id": id,
            "question": null,
            "correct": correct,
            "expected_answer": "A",
            "user_answer": "A",
            "skill": "Grammar",
            "topic": "Tense",
            "explain": "Because."
        })
    }

    #[test]
    fn candidate_requires_both_keys() {
        assert!(SchemaGate::is_candidate(&json!({"total_score": 1, "per_question": []})));
        assert!(!SchemaGate::is_candidate(&json!({"total_score": 1})));
        assert!(!SchemaGate::is_candidate(&json!([1, 2])));
    }

    #[test]
    fn minimal_payload_is_accepted() {
        let payload = SchemaGate::validate(json!({
            "total_score": 7,
            "per_question": [outcome(1, true)]
        }))
        .unwrap();
        assert_eq!(payload.total_score, 7);
        assert_eq!(payload.per_question[0].explanation, "Because.");
        assert!(payload.skill_summary.is_none());
        assert!(payload.recommendations.is_none());
        assert!(payload.degraded.is_empty());
    }

    #[test]
    fn non_object_is_rejected_without_keys() {
        let err = SchemaGate::validate(json!([1, 2])).unwrap_err();
        match err {
            EnrichmentError::Schema { reason, keys } => {
                assert!(reason.contains("array"));
                assert!(keys.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_mandatory_key_lists_present_keys() {
        let err = SchemaGate::validate(json!({"total_score": 3, "weak_topics": []})).unwrap_err();
        match err {
            EnrichmentError::Schema { reason, keys } => {
                assert_eq!(reason, "missing mandatory key(s): per_question");
                assert_eq!(keys, vec!["total_score".to_string(), "weak_topics".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn malformed_mandatory_fields_are_rejected() {
        for payload in [
            json!({"total_score": -1, "per_question": []}),
            json!({"total_score": "seven", "per_question": []}),
            json!({"total_score": "-3", "per_question": []}),
            json!({"total_score": 2.5, "per_question": []}),
            json!({"total_score": 1, "per_question": {"1": true}}),
            json!({"total_score": 1, "per_question": [{"id": "one", "correct": true}]}),
        ] {
            assert!(
                matches!(SchemaGate::validate(payload.clone()), Err(EnrichmentError::Schema { .. })),
                "accepted {payload}"
            );
        }
    }

    #[test]
    fn integral_float_score_is_accepted() {
        let payload = SchemaGate::validate(json!({"total_score": 7.0, "per_question": []})).unwrap();
        assert_eq!(payload.total_score, 7);
    }

    #[test]
    fn quoted_integers_are_accepted() {
        let payload = SchemaGate::validate(json!({
            "total_score": "1",
            "total_questions": " 2 ",
            "per_question": [
                {"id": "1", "correct": true, "explain": "ok"},
                {"id": 2, "correct": false}
            ]
        }))
        .unwrap();
        assert_eq!(payload.total_score, 1);
        assert_eq!(payload.total_questions, Some(2));
        assert_eq!(payload.per_question[0].id, 1);
        assert_eq!(payload.per_question[1].id, 2);
        assert!(payload.degraded.is_empty());
    }

    #[test]
    fn optional_fields_are_parsed() {
        let payload = SchemaGate::validate(json!({
            "total_score": 1,
            "total_questions": 2,
            "per_question": [outcome(1, true), outcome(2, false)],
            "skill_summary": [{"skill": "Grammar", "total": 2, "correct": 1, "accuracy": 50.0}],
            "weak_topics": ["Grammar - Tense"],
            "recommendations": ["Review tenses"],
            "current_level": "B1",
            "post_test_level": "B2"
        }))
        .unwrap();
        assert_eq!(payload.total_questions, Some(2));
        assert_eq!(payload.skill_summary.unwrap()[0].skill, "Grammar");
        assert_eq!(payload.weak_topics, Some(vec!["Grammar - Tense".to_string()]));
        assert_eq!(payload.recommendations, Some(vec!["Review tenses".to_string()]));
        assert_eq!(payload.current_level.as_deref(), Some("B1"));
        assert_eq!(payload.post_test_level.as_deref(), Some("B2"));
        assert!(payload.degraded.is_empty());
    }

    #[test]
    fn null_optionals_are_absent() {
        let payload = SchemaGate::validate(json!({
            "total_score": 0,
            "per_question": [],
            "recommendations": null,
            "personalized_plan": null,
            "current_level": null
        }))
        .unwrap();
        assert!(payload.recommendations.is_none());
        assert!(payload.personalized_plan.is_none());
        assert!(payload.current_level.is_none());
        assert!(payload.degraded.is_empty());
    }

    #[test]
    fn malformed_optionals_degrade() {
        let payload = SchemaGate::validate(json!({
            "total_score": 0,
            "per_question": [],
            "total_questions": "ten",
            "weak_topics": "Grammar - Tense",
            "current_level": 5
        }))
        .unwrap();
        assert!(payload.total_questions.is_none());
        assert!(payload.weak_topics.is_none());
        assert!(payload.current_level.is_none());
        let fields: Vec<&str> = payload
            .degraded
            .iter()
            .filter_map(|e| match e {
                EnrichmentError::Structural { field, .. } => Some(field.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(fields, vec!["total_questions", "weak_topics", "current_level"]);
    }

    #[test]
    fn invalid_skill_entries_are_skipped() {
        let payload = SchemaGate::validate(json!({
            "total_score": 0,
            "per_question": [],
            "skill_summary": [
                {"skill": "Grammar", "total": 2, "correct": 3, "accuracy": 150.0},
                {"skill": "Reading"},
                {"skill": "Listening", "total": 4, "correct": 1, "accuracy": 25.0}
            ]
        }))
        .unwrap();
        let summary = payload.skill_summary.unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].skill, "Listening");
    }

    #[test]
    fn all_invalid_skill_entries_drop_the_field() {
        let payload = SchemaGate::validate(json!({
            "total_score": 0,
            "per_question": [],
            "skill_summary": [{"skill": "Grammar", "accuracy": "high"}]
        }))
        .unwrap();
        assert!(payload.skill_summary.is_none());
        assert_eq!(payload.degraded.len(), 1);
    }

    #[test]
    fn non_string_list_items_are_skipped() {
        let payload = SchemaGate::validate(json!({
            "total_score": 0,
            "per_question": [],
            "recommendations": ["Read more", 3, null, "Practice daily"]
        }))
        .unwrap();
        assert_eq!(
            payload.recommendations,
            Some(vec!["Read more".to_string(), "Practice daily".to_string()])
        );
    }

    #[test]
    fn empty_plan_is_absent() {
        for plan in [json!({}), json!([]), json!("")] {
            let payload = SchemaGate::validate(json!({
                "total_score": 0,
                "per_question": [],
                "personalized_plan": plan
            }))
            .unwrap();
            assert!(payload.personalized_plan.is_none(), "kept {plan}");
            assert!(payload.degraded.is_empty());
        }
    }

    #[test]
    fn malformed_plan_is_kept_opaque() {
        let payload = SchemaGate::validate(json!({
            "total_score": 0,
            "per_question": [],
            "personalized_plan": {"weekly_goals": [{"topic": "Listening drills", "materials": ["Random PDF"]}]}
        }))
        .unwrap();
        assert!(matches!(payload.personalized_plan, Some(PlanPayload::Opaque(_))));
        assert!(matches!(
            payload.degraded.as_slice(),
            [EnrichmentError::Structural { field, .. }] if field == "personalized_plan"
        ));
    }
}
