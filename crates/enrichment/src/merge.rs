//! Field-by-field override of the baseline result by an approved payload.
//!
//! Enrichment wins for a field only when the payload carries it in a
//! well-formed state. Fields are replaced whole, never deep-merged: an
//! enrichment `per_question` list replaces every baseline outcome,
//! explanations included.

use lexigrade_core::{GradingResult, PlanPayload};
use serde::Serialize;
use tracing::{debug, warn};

use crate::schema::EnrichmentPayload;

/// Where a merged field's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Baseline,
    Enrichment,
}

/// The decision taken for one result field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDecision {
    pub field: &'static str,
    pub source: Provenance,
}

/// Audit trail of one merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// One decision per result field, in result field order.
    pub fields: Vec<FieldDecision>,
    /// `Some(true)` for a structured plan, `Some(false)` for an opaque one.
    pub plan_structured: Option<bool>,
    /// Degraded or ignored parts of the payload.
    pub degraded: Vec<String>,
}

impl MergeReport {
    pub fn source_of(&self, field: &str) -> Option<Provenance> {
        self.fields
            .iter()
            .find(|d| d.field == field)
            .map(|d| d.source)
    }

    /// Fields whose value came from the enrichment payload.
    pub fn overridden(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|d| d.source == Provenance::Enrichment)
            .map(|d| d.field)
            .collect()
    }

    fn decide<T>(&mut self, field: &'static str, enrichment: Option<T>, baseline: T) -> T {
        let (value, source) = match enrichment {
            Some(value) => (value, Provenance::Enrichment),
            None => (baseline, Provenance::Baseline),
        };
        debug!(field, ?source, "Merged field");
        self.fields.push(FieldDecision { field, source });
        value
    }
}

/// Merges an [`EnrichmentPayload`] over a baseline [`GradingResult`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconciliationMerger;

impl ReconciliationMerger {
    pub fn new() -> Self {
        Self
    }

    pub fn merge(&self, baseline: GradingResult, payload: EnrichmentPayload) -> GradingResult {
        self.merge_with_report(baseline, payload).0
    }

    /// Merge and return the audit trail alongside the result.
    ///
    /// An enrichment `per_question` whose length differs from the baseline
    /// (one outcome per answer-key entry) is ignored, so the result always
    /// has one outcome per key entry.
    pub fn merge_with_report(
        &self,
        baseline: GradingResult,
        payload: EnrichmentPayload,
    ) -> (GradingResult, MergeReport) {
        let mut report = MergeReport {
            degraded: payload.degraded.iter().map(ToString::to_string).collect(),
            ..MergeReport::default()
        };

        let GradingResult {
            total_score,
            total_questions,
            per_question,
            skill_summary,
            weak_topics,
            recommendations,
            personalized_plan,
            current_level,
            post_test_level,
        } = baseline;

        let enriched_questions = if payload.per_question.len() == per_question.len() {
            Some(payload.per_question)
        } else {
            warn!(
                enrichment = payload.per_question.len(),
                baseline = per_question.len(),
                "Enrichment per_question length does not match the answer key; keeping baseline"
            );
            report.degraded.push(format!(
                "per_question ignored: {} outcomes for {} answer-key entries",
                payload.per_question.len(),
                per_question.len()
            ));
            None
        };

        let merged = GradingResult {
            total_score: report.decide("total_score", Some(payload.total_score), total_score),
            total_questions: report.decide("total_questions", payload.total_questions, total_questions),
            per_question: report.decide("per_question", enriched_questions, per_question),
            skill_summary: report.decide("skill_summary", payload.skill_summary, skill_summary),
            weak_topics: report.decide("weak_topics", payload.weak_topics, weak_topics),
            recommendations: report.decide(
                "recommendations",
                payload.recommendations.map(Some),
                recommendations,
            ),
            personalized_plan: report.decide(
                "personalized_plan",
                payload.personalized_plan.map(Some),
                personalized_plan,
            ),
            current_level: report.decide("current_level", payload.current_level, current_level),
            post_test_level: report.decide("post_test_level", payload.post_test_level, post_test_level),
        };
        report.plan_structured = merged.personalized_plan.as_ref().map(PlanPayload::is_structured);

        (merged, report)
    }
}
