//! # Lexigrade Core
//!
//! Domain types and error definitions for the Lexigrade exam grader.
//! This crate performs **no I/O** and reads no process-wide state; it
//! defines the value objects every other crate computes over.
//!
//! ## Data flow
//!
//! ```text
//! AnswerKeyEntry[] + RawAnswerSet ──▶ BaselineGrade ──▶ GradingResult
//!                                                         ▲
//!                 enrichment text ──▶ (lexigrade-enrichment)
//! ```

pub mod answer_key;
pub mod error;
pub mod outcome;
pub mod plan;
pub mod profile;
pub mod result;

// Re-export key types at crate root for ergonomics
pub use answer_key::{AnswerId, AnswerKeyEntry, RawAnswerSet};
pub use error::{Error, Result};
pub use outcome::{PerQuestionOutcome, SkillAggregate, round2};
pub use plan::{PersonalizedPlan, PlanPayload, ProgressSpeed, ProgressTrend, WeeklyGoal};
pub use profile::{GradeRequest, LearnerProfile, TestHistoryItem, TestInfo};
pub use result::{BaselineGrade, GradingResult, UNKNOWN_LEVEL};
