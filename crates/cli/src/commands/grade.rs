//! `lexigrade grade` — Grade a request and reconcile optional enrichment.

use std::path::{Path, PathBuf};

use lexigrade_core::{GradeRequest, GradingResult};
use lexigrade_enrichment::{
    EnrichmentError, EnrichmentSource, ExtractionStrategy, FieldDecision, MaterialRewrite,
    Reconciler, Reconciliation, grade_request,
};
use lexigrade_grader::LocalGrader;
use serde::Serialize;
use tracing::warn;

use super::{load_config, read_text, unwrap_envelope};

pub struct GradeArgs {
    pub request: PathBuf,
    pub enrichment: Option<PathBuf>,
    pub envelope: bool,
    pub upstream_error: Option<String>,
    pub audit: bool,
    pub pretty: bool,
}

#[derive(Serialize)]
struct GradeOutput<'a> {
    result: &'a GradingResult,
    diagnostic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    audit: Option<Audit<'a>>,
}

#[derive(Serialize)]
struct Audit<'a> {
    strategy: Option<ExtractionStrategy>,
    fields: &'a [FieldDecision],
    plan: Option<&'static str>,
    degraded: &'a [String],
    rewrites: &'a [MaterialRewrite],
    /// Raw text excerpt when extraction failed.
    excerpt: Option<&'a str>,
}

pub async fn run(config_path: Option<&Path>, args: GradeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;

    let request = GradeRequest::from_json(&read_text(&args.request).await?)?;

    if args.enrichment.is_some() && !request.use_enrichment {
        warn!("Request has use_enrichment = false, ignoring --enrichment");
    }

    let source = match (args.upstream_error, &args.enrichment) {
        (Some(message), _) => EnrichmentSource::Failed(message),
        (None, Some(path)) => {
            let raw = read_text(path).await?;
            if args.envelope {
                match unwrap_envelope(&raw, config.extraction.max_depth) {
                    Ok(text) => EnrichmentSource::Text(text),
                    Err(e) => EnrichmentSource::Failed(e.to_string()),
                }
            } else {
                EnrichmentSource::Text(raw)
            }
        }
        (None, None) => EnrichmentSource::NotRequested,
    };

    let grader = LocalGrader::new(config.grading.clone());
    let reconciler = Reconciler::from_config(&config);
    let reconciliation = grade_request(&grader, &reconciler, &request, source);

    println!("{}", render(&reconciliation, args.audit, args.pretty)?);
    Ok(())
}

/// Serialize a reconciliation as `{"result", "diagnostic"[, "audit"]}`.
pub fn render(reconciliation: &Reconciliation, audit: bool, pretty: bool) -> serde_json::Result<String> {
    let output = GradeOutput {
        result: &reconciliation.result,
        diagnostic: reconciliation.diagnostic(),
        audit: audit.then(|| audit_of(reconciliation)),
    };
    if pretty {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string(&output)
    }
}

fn audit_of(reconciliation: &Reconciliation) -> Audit<'_> {
    let report = reconciliation.report.as_ref();
    Audit {
        strategy: reconciliation.strategy,
        fields: report.map(|r| r.fields.as_slice()).unwrap_or_default(),
        plan: report.and_then(|r| r.plan_structured).map(|structured| {
            if structured { "structured" } else { "opaque" }
        }),
        degraded: report.map(|r| r.degraded.as_slice()).unwrap_or_default(),
        rewrites: &reconciliation.rewrites,
        excerpt: match &reconciliation.failure {
            Some(EnrichmentError::Extraction { excerpt, .. }) => Some(excerpt.as_str()),
            _ => None,
        },
    }
}
