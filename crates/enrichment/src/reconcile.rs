//! The reconciliation pipeline: extract, gate, merge, then enforce the catalog.

use lexigrade_config::{AppConfig, ExtractionConfig};
use lexigrade_core::{GradeRequest, GradingResult};
use lexigrade_grader::LocalGrader;
use tracing::{debug, info, warn};

use crate::EnrichmentError;
use crate::extract::{ExtractionStrategy, TextJsonExtractor};
use crate::materials::{MaterialCatalog, MaterialResolver, MaterialRewrite};
use crate::merge::{MergeReport, ReconciliationMerger};
use crate::schema::SchemaGate;

/// What the caller obtained from the enrichment service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentSource {
    /// Enrichment was not asked for.
    NotRequested,
    /// The raw text the service returned.
    Text(String),
    /// Fetching the text failed; carries the caller's error message.
    Failed(String),
}

/// Outcome of reconciling one baseline result.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// Always a complete result; the baseline when enrichment failed.
    pub result: GradingResult,
    pub strategy: Option<ExtractionStrategy>,
    pub report: Option<MergeReport>,
    pub rewrites: Vec<MaterialRewrite>,
    /// Why enrichment was not applied, if it was requested and failed.
    pub failure: Option<EnrichmentError>,
}

impl Reconciliation {
    fn baseline(result: GradingResult, failure: Option<EnrichmentError>) -> Self {
        Self {
            result,
            strategy: None,
            report: None,
            rewrites: Vec::new(),
            failure,
        }
    }

    pub fn is_enriched(&self) -> bool {
        self.report.is_some()
    }

    /// Human-readable reason enrichment was unavailable.
    pub fn diagnostic(&self) -> Option<String> {
        self.failure.as_ref().map(ToString::to_string)
    }
}

/// Runs the full enrichment pipeline over a baseline result.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    extractor: TextJsonExtractor,
    merger: ReconciliationMerger,
    resolver: MaterialResolver,
}

impl Reconciler {
    pub fn new(extraction: ExtractionConfig, catalog: MaterialCatalog) -> Self {
        Self {
            extractor: TextJsonExtractor::new(extraction),
            merger: ReconciliationMerger::new(),
            resolver: MaterialResolver::new(catalog),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.extraction.clone(),
            MaterialCatalog::from_config(&config.catalog),
        )
    }

    pub fn extractor(&self) -> &TextJsonExtractor {
        &self.extractor
    }

    /// Reconcile `baseline` with whatever `source` holds.
    ///
    /// Never fails: extraction and schema failures fall back to the baseline
    /// and are reported in [`Reconciliation::failure`].
    pub fn reconcile(&self, baseline: GradingResult, source: EnrichmentSource) -> Reconciliation {
        let text = match source {
            EnrichmentSource::NotRequested => {
                debug!("Enrichment not requested, returning baseline");
                return Reconciliation::baseline(baseline, None);
            }
            EnrichmentSource::Failed(message) => {
                warn!(error = %message, "Enrichment service failed, returning baseline");
                return Reconciliation::baseline(
                    baseline,
                    Some(EnrichmentError::UpstreamUnavailable(message)),
                );
            }
            EnrichmentSource::Text(text) => text,
        };

        let payload = self
            .extractor
            .extract_where(&text, SchemaGate::is_candidate)
            .and_then(|extracted| {
                SchemaGate::validate(extracted.value).map(|payload| (payload, extracted.strategy))
            });
        let (payload, strategy) = match payload {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "Enrichment unusable, returning baseline");
                return Reconciliation::baseline(baseline, Some(e));
            }
        };

        let (mut result, mut report) = self.merger.merge_with_report(baseline, payload);

        let mut rewrites = Vec::new();
        if let Some(plan) = result.personalized_plan.take() {
            let (plan, plan_rewrites) =
                self.resolver
                    .resolve_with_report(plan, &result.skill_summary, &result.weak_topics);
            if plan.is_none() {
                report.plan_structured = None;
                report
                    .degraded
                    .push("personalized_plan dropped: opaque plan is not a JSON object".into());
            }
            result.personalized_plan = plan;
            rewrites = plan_rewrites;
        }

        info!(
            ?strategy,
            overridden = ?report.overridden(),
            degraded = report.degraded.len(),
            rewrites = rewrites.len(),
            "Enrichment reconciled"
        );

        Reconciliation {
            result,
            strategy: Some(strategy),
            report: Some(report),
            rewrites,
            failure: None,
        }
    }
}

/// Grade a request and reconcile it with `source`.
///
/// `source` is ignored unless the request asks for enrichment; a request
/// that asks for it without a source is reported as upstream-unavailable.
pub fn grade_request(
    grader: &LocalGrader,
    reconciler: &Reconciler,
    request: &GradeRequest,
    source: EnrichmentSource,
) -> Reconciliation {
    let grade = grader.grade(&request.answer_key, &request.student_answers);
    let baseline = GradingResult::baseline(grade, request.profile_level());

    let source = match (request.use_enrichment, source) {
        (false, EnrichmentSource::NotRequested) => EnrichmentSource::NotRequested,
        (false, _) => {
            debug!("Request did not ask for enrichment, ignoring supplied source");
            EnrichmentSource::NotRequested
        }
        (true, EnrichmentSource::NotRequested) => {
            EnrichmentSource::Failed("no enrichment response supplied".into())
        }
        (true, source) => source,
    };

    reconciler.reconcile(baseline, source)
}
