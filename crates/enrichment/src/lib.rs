//! Enrichment reconciliation: merging an untrusted, model-generated grading
//! result into the deterministic baseline.
//!
//! The external service answers in free-form text that is *supposed* to be
//! JSON. This crate recovers that JSON, gates it on the fields that make it
//! usable, merges it field by field over the baseline, and forces every
//! study material in the merged plan back into the closed catalog.
//!
//! # Pipeline
//!
//! ```text
//! raw text ──▶ TextJsonExtractor ──▶ SchemaGate ──▶ ReconciliationMerger ──▶ MaterialResolver
//!   │              (direct │ embedded │ span │ repaired)        ▲
//!   │                                                           │
//!   └── on failure: baseline result + diagnostic        baseline GradingResult
//! ```
//!
//! Every stage is synchronous and pure. Fetching the text is the caller's
//! job; an already-failed fetch is passed in as [`EnrichmentSource::Failed`].

mod envelope;
mod extract;
mod materials;
mod merge;
mod reconcile;
mod repair;
mod schema;
mod visit;

pub use envelope::response_text;
pub use extract::{Extracted, ExtractionStrategy, TextJsonExtractor};
pub use materials::{MaterialCatalog, MaterialResolver, MaterialRewrite, RewriteScope};
pub use merge::{FieldDecision, MergeReport, Provenance, ReconciliationMerger};
pub use reconcile::{EnrichmentSource, Reconciler, Reconciliation, grade_request};
pub use repair::repair_json_text;
pub use schema::{EnrichmentPayload, MANDATORY_KEYS, SchemaGate};

/// Re-export for convenience.
pub type EnrichmentResult<T> = std::result::Result<T, EnrichmentError>;

/// Errors from the enrichment subsystem.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EnrichmentError {
    /// No JSON structure could be recovered from the external text.
    #[error("no JSON could be recovered from enrichment text: {reason}")]
    Extraction { reason: String, excerpt: String },

    /// The recovered JSON is not a usable enrichment payload.
    #[error("enrichment payload rejected: {reason} (keys present: {keys:?})")]
    Schema { reason: String, keys: Vec<String> },

    /// An optional sub-structure was malformed and was skipped or kept opaque.
    #[error("malformed optional field '{field}': {reason}")]
    Structural { field: String, reason: String },

    /// The caller reported that fetching the enrichment text failed.
    #[error("enrichment service unavailable: {0}")]
    UpstreamUnavailable(String),
}
