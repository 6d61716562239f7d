//! Deterministic local grading.
//!
//! [`normalize`] resolves each answer-key entry against the learner's raw
//! answers; [`LocalGrader`] turns those into per-question outcomes, per-skill
//! accuracy, and a short list of weak topics. Everything here is pure and
//! total: absent or malformed answers grade as incorrect, never as errors.

pub mod grader;
pub mod normalize;

pub use grader::LocalGrader;
pub use normalize::{NormalizedAnswer, normalize_answer, normalize_entry, resolve_answer};
