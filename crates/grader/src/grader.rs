//! Local grading and skill/topic aggregation.
//!
//! # Weak-topic selection
//!
//! Weak topics are chosen greedily, skill by skill, in the order skills are
//! first seen in the answer key. Each skill contributes its top
//! `topics_per_skill` incorrect topics (ties keep first-seen topic order),
//! and the list stops once `weak_topic_limit` labels are collected. This is
//! **not** a global top-N by frequency: a skill that appears early in the
//! key can crowd out a later skill with more misses.

use indexmap::IndexMap;
use lexigrade_config::GradingConfig;
use lexigrade_core::{AnswerKeyEntry, BaselineGrade, PerQuestionOutcome, RawAnswerSet, SkillAggregate};
use std::collections::HashSet;
use tracing::debug;

use crate::normalize::normalize_entry;

/// Running per-skill counters.
#[derive(Debug, Default)]
struct SkillStats {
    total: u32,
    correct: u32,
    /// Incorrect answers per topic, in first-seen order.
    missed_topics: IndexMap<String, u32>,
}

/// Grades learner answers against an answer key.
#[derive(Debug, Clone, Default)]
pub struct LocalGrader {
    config: GradingConfig,
}

impl LocalGrader {
    pub fn new(config: GradingConfig) -> Self {
        Self { config }
    }

    /// Grade every entry of `answer_key`, in order.
    ///
    /// The returned `per_question` has exactly one outcome per key entry, in
    /// key order, and `total_score` is the number of correct outcomes.
    pub fn grade(&self, answer_key: &[AnswerKeyEntry], answers: &RawAnswerSet) -> BaselineGrade {
        let mut per_question = Vec::with_capacity(answer_key.len());
        let mut skills: IndexMap<String, SkillStats> = IndexMap::new();
        let mut total_score = 0u32;

        for entry in answer_key {
            let normalized = normalize_entry(entry, answers);
            let correct = normalized.is_correct();
            if correct {
                total_score += 1;
            }

            let explanation = if correct {
                "Correct.".to_string()
            } else {
                format!(
                    "Expected \"{}\" but got \"{}\".",
                    normalized.expected,
                    normalized.raw_answer.unwrap_or("no answer")
                )
            };

            let skill_key = entry
                .skill
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| self.config.unknown_label.clone());
            let stats = skills.entry(skill_key).or_default();
            stats.total += 1;
            if correct {
                stats.correct += 1;
            } else if let Some(topic) = entry.topic.as_deref().filter(|t| !t.is_empty()) {
                *stats.missed_topics.entry(topic.to_string()).or_insert(0) += 1;
            }

            debug!(question_id = entry.id, correct, "Graded question");

            per_question.push(PerQuestionOutcome {
                id: entry.id,
                question: entry.question.clone(),
                correct,
                expected_answer: normalized.expected,
                user_answer: normalized.user_answer,
                skill: entry.skill.clone(),
                topic: entry.topic.clone(),
                explanation,
            });
        }

        let skill_summary = skills
            .iter()
            .map(|(skill, stats)| SkillAggregate::new(skill.clone(), stats.total, stats.correct))
            .collect();
        let weak_topics = self.weak_topics(&skills);

        debug!(
            total_score,
            total_questions = answer_key.len(),
            weak_topics = weak_topics.len(),
            "Local grading complete"
        );

        BaselineGrade {
            total_score,
            total_questions: u32::try_from(answer_key.len()).unwrap_or(u32::MAX),
            per_question,
            skill_summary,
            weak_topics,
        }
    }

    fn weak_topics(&self, skills: &IndexMap<String, SkillStats>) -> Vec<String> {
        let candidates = skills.iter().flat_map(|(skill, stats)| {
            let mut topics: Vec<(&String, &u32)> = stats.missed_topics.iter().collect();
            // Stable sort: equal counts keep first-seen order.
            topics.sort_by(|a, b| b.1.cmp(a.1));
            topics
                .into_iter()
                .take(self.config.topics_per_skill)
                .map(move |(topic, _)| format!("{skill} - {topic}"))
        });

        let mut seen = HashSet::new();
        let mut weak = Vec::new();
        for label in candidates {
            if weak.len() >= self.config.weak_topic_limit {
                break;
            }
            if seen.insert(label.clone()) {
                weak.push(label);
            }
        }
        weak
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexigrade_core::AnswerId;

    fn entry(id: i64, answer: &str, skill: &str, topic: &str) -> AnswerKeyEntry {
        AnswerKeyEntry::new(id, answer).with_skill(skill).with_topic(topic)
    }

    #[test]
    fn end_to_end_two_questions() {
        let key = vec![
            entry(1, "A", "Grammar", "Tense"),
            entry(2, "B", "Reading", "Inference"),
        ];
        let answers: RawAnswerSet = [("1", "A"), ("2", "C")].into_iter().collect();

        let grade = LocalGrader::default().grade(&key, &answers);

        assert_eq!(grade.total_score, 1);
        assert_eq!(grade.total_questions, 2);
        assert!(grade.per_question[0].correct);
        assert!(!grade.per_question[1].correct);
        assert_eq!(grade.per_question[1].explanation, "Expected \"B\" but got \"C\".");
        assert_eq!(
            grade.skill_summary,
            vec![
                SkillAggregate {
                    skill: "Grammar".into(),
                    total: 1,
                    correct: 1,
                    accuracy: 100.0
                },
                SkillAggregate {
                    skill: "Reading".into(),
                    total: 1,
                    correct: 0,
                    accuracy: 0.0
                },
            ]
        );
        assert_eq!(grade.weak_topics, vec!["Reading - Inference".to_string()]);
    }

    #[test]
    fn output_preserves_key_order_and_length() {
        let key: Vec<AnswerKeyEntry> = [7, 3, 11, 1]
            .into_iter()
            .map(|id| AnswerKeyEntry::new(id, "A"))
            .collect();
        let answers: RawAnswerSet = [("3", "a"), ("1", "b")].into_iter().collect();

        let grade = LocalGrader::default().grade(&key, &answers);

        let ids: Vec<i64> = grade.per_question.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![7, 3, 11, 1]);
        let correct = grade.per_question.iter().filter(|o| o.correct).count();
        assert_eq!(grade.total_score as usize, correct);
        assert_eq!(correct, 1);
    }

    #[test]
    fn unanswered_outcome_has_null_answer() {
        let key = vec![AnswerKeyEntry::new(1, "b")];
        let grade = LocalGrader::default().grade(&key, &RawAnswerSet::new());
        let outcome = &grade.per_question[0];
        assert!(!outcome.correct);
        assert!(outcome.user_answer.is_none());
        assert_eq!(outcome.expected_answer, "B");
        assert_eq!(outcome.explanation, "Expected \"B\" but got \"no answer\".");
    }

    #[test]
    fn padded_lowercase_answer_is_correct() {
        let key = vec![AnswerKeyEntry::new(1, "b")];
        let answers: RawAnswerSet = [("1", " b ")].into_iter().collect();
        let grade = LocalGrader::default().grade(&key, &answers);
        assert!(grade.per_question[0].correct);
        assert_eq!(grade.per_question[0].user_answer.as_deref(), Some("B"));
    }

    #[test]
    fn integer_keyed_answers_are_found() {
        let key = vec![AnswerKeyEntry::new(4, "D")];
        let answers: RawAnswerSet = [(AnswerId::Number(4), "d")].into_iter().collect();
        assert_eq!(LocalGrader::default().grade(&key, &answers).total_score, 1);
    }

    #[test]
    fn missing_skill_maps_to_unknown() {
        let key = vec![AnswerKeyEntry::new(1, "A").with_topic("Misc")];
        let grade = LocalGrader::default().grade(&key, &RawAnswerSet::new());
        assert_eq!(grade.skill_summary[0].skill, "Unknown");
        assert_eq!(grade.weak_topics, vec!["Unknown - Misc".to_string()]);
        // The outcome keeps the absent skill.
        assert!(grade.per_question[0].skill.is_none());
    }

    #[test]
    fn empty_skill_maps_to_unknown() {
        let key = vec![AnswerKeyEntry::new(1, "A").with_skill("").with_topic("Tense")];
        let grade = LocalGrader::default().grade(&key, &RawAnswerSet::new());
        assert_eq!(grade.skill_summary.len(), 1);
        assert_eq!(grade.skill_summary[0].skill, "Unknown");
        assert_eq!(grade.weak_topics, vec!["Unknown - Tense".to_string()]);
    }

    #[test]
    fn topic_ties_broken_by_first_seen() {
        // Grammar misses: X x5, Y x3, Z x5 (X seen before Z).
        let mut key = Vec::new();
        let mut id = 0;
        for (topic, count) in [("X", 5), ("Y", 3), ("Z", 5)] {
            for _ in 0..count {
                id += 1;
                key.push(entry(id, "A", "Grammar", topic));
            }
        }
        let grade = LocalGrader::default().grade(&key, &RawAnswerSet::new());
        assert_eq!(
            grade.weak_topics,
            vec!["Grammar - X".to_string(), "Grammar - Z".to_string()]
        );
    }

    #[test]
    fn weak_topics_are_greedy_and_capped() {
        // Grammar (seen first) has two weak topics with one miss each;
        // Reading has topics with many misses but only one slot remains.
        let mut key = vec![
            entry(1, "A", "Grammar", "Tense"),
            entry(2, "A", "Grammar", "Articles"),
        ];
        for id in 3..8 {
            key.push(entry(id, "A", "Reading", "Inference"));
        }
        for id in 8..12 {
            key.push(entry(id, "A", "Reading", "Detail"));
        }
        let grade = LocalGrader::default().grade(&key, &RawAnswerSet::new());
        assert_eq!(
            grade.weak_topics,
            vec![
                "Grammar - Tense".to_string(),
                "Grammar - Articles".to_string(),
                "Reading - Inference".to_string(),
            ]
        );
    }

    #[test]
    fn correct_answers_do_not_count_as_weak() {
        let key = vec![entry(1, "A", "Listening", "Part 1")];
        let answers: RawAnswerSet = [("1", "A")].into_iter().collect();
        let grade = LocalGrader::default().grade(&key, &answers);
        assert!(grade.weak_topics.is_empty());
        assert_eq!(grade.skill_summary[0].accuracy, 100.0);
    }

    #[test]
    fn custom_limits_are_honoured() {
        let grader = LocalGrader::new(GradingConfig {
            unknown_label: "Other".into(),
            weak_topic_limit: 1,
            topics_per_skill: 1,
        });
        let key = vec![
            entry(1, "A", "Grammar", "Tense"),
            entry(2, "A", "Grammar", "Articles"),
            AnswerKeyEntry::new(3, "A").with_topic("Misc"),
        ];
        let grade = grader.grade(&key, &RawAnswerSet::new());
        assert_eq!(grade.weak_topics, vec!["Grammar - Tense".to_string()]);
        assert_eq!(grade.skill_summary[1].skill, "Other");
    }

    #[test]
    fn empty_key_grades_to_zero() {
        let grade = LocalGrader::default().grade(&[], &RawAnswerSet::new());
        assert_eq!(grade.total_score, 0);
        assert_eq!(grade.total_questions, 0);
        assert!(grade.per_question.is_empty());
        assert!(grade.skill_summary.is_empty());
        assert!(grade.weak_topics.is_empty());
    }

    #[test]
    fn baseline_serializes_like_a_result() {
        let key = vec![entry(1, "A", "Grammar", "Tense")];
        let grade = LocalGrader::default().grade(&key, &RawAnswerSet::new());
        let value = serde_json::to_value(&grade).unwrap();
        assert_eq!(value["per_question"][0]["user_answer"], serde_json::Value::Null);
    }
}
