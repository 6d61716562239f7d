//! Answer key entries and the learner's raw answer set.
//!
//! Question identifiers arrive either as integers (answer keys) or as their
//! string form (JSON object keys in the learner's answers). [`AnswerId`]
//! keeps the form the value was supplied in so lookups can try the given
//! form first and the alternate form second.

use std::collections::HashMap;

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// One question of the authoritative answer key.
///
/// The order of entries in a key defines the order of per-question output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerKeyEntry {
    /// Question identifier, unique within a key.
    pub id: i64,

    /// Question text, if the key carries it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,

    /// The expected answer (raw, not yet normalized).
    #[serde(default, alias = "expected_answer")]
    pub answer: String,

    /// Skill this question exercises (e.g. "Grammar").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,

    /// Topic within the skill (e.g. "Tense").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

impl AnswerKeyEntry {
    /// Create an entry with only an id and an expected answer.
    pub fn new(id: i64, answer: impl Into<String>) -> Self {
        Self {
            id,
            question: None,
            answer: answer.into(),
            skill: None,
            topic: None,
        }
    }

    /// Builder-style skill setter.
    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.skill = Some(skill.into());
        self
    }

    /// Builder-style topic setter.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Builder-style question text setter.
    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }
}

/// A question identifier in the form it was supplied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnswerId {
    Number(i64),
    Text(String),
}

impl AnswerId {
    /// The other representation of the same identifier, if one exists.
    ///
    /// `Number(3)` ↔ `Text("3")`. Text that is not an integer has no
    /// alternate form.
    pub fn alternate(&self) -> Option<AnswerId> {
        match self {
            AnswerId::Number(n) => Some(AnswerId::Text(n.to_string())),
            AnswerId::Text(s) => s.trim().parse::<i64>().ok().map(AnswerId::Number),
        }
    }
}

impl From<i64> for AnswerId {
    fn from(n: i64) -> Self {
        AnswerId::Number(n)
    }
}

impl From<&str> for AnswerId {
    fn from(s: &str) -> Self {
        AnswerId::Text(s.to_string())
    }
}

impl From<String> for AnswerId {
    fn from(s: String) -> Self {
        AnswerId::Text(s)
    }
}

impl std::fmt::Display for AnswerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnswerId::Number(n) => write!(f, "{n}"),
            AnswerId::Text(s) => f.write_str(s),
        }
    }
}

/// The learner's answers, keyed by question identifier.
///
/// An absent key and a `None` value both mean "unanswered".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAnswerSet {
    answers: HashMap<AnswerId, Option<String>>,
}

impl RawAnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answer for a question.
    pub fn insert(&mut self, id: impl Into<AnswerId>, answer: impl Into<String>) {
        self.answers.insert(id.into(), Some(answer.into()));
    }

    /// Record an explicit "no answer" for a question.
    pub fn insert_unanswered(&mut self, id: impl Into<AnswerId>) {
        self.answers.insert(id.into(), None);
    }

    /// Look up an answer by identifier in exactly the given form.
    pub fn get(&self, id: &AnswerId) -> Option<&str> {
        self.answers.get(id).and_then(|a| a.as_deref())
    }

    /// Number of recorded identifiers (answered or explicitly unanswered).
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

impl<K: Into<AnswerId>, V: Into<String>> FromIterator<(K, V)> for RawAnswerSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = RawAnswerSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

impl Serialize for RawAnswerSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.answers.len()))?;
        for (id, answer) in &self.answers {
            map.serialize_entry(&id.to_string(), answer)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RawAnswerSet {
    /// Accepts a JSON object of `id -> answer`. String values are kept,
    /// numbers and booleans are taken in their textual form, anything else
    /// (null, arrays, objects) counts as unanswered.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: HashMap<String, serde_json::Value> = HashMap::deserialize(deserializer)?;
        let answers = raw
            .into_iter()
            .map(|(key, value)| {
                let answer = match value {
                    serde_json::Value::String(s) => Some(s),
                    serde_json::Value::Number(n) => Some(n.to_string()),
                    serde_json::Value::Bool(b) => Some(b.to_string()),
                    _ => None,
                };
                (AnswerId::Text(key), answer)
            })
            .collect();
        Ok(Self { answers })
    }
}
