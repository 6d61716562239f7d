//! Recovering a single JSON value from model-generated text.
//!
//! Stages, first success wins:
//!
//! 1. **Direct**: strip one leading/trailing code fence, strict parse.
//! 2. **Embedded**: if the parsed value is a wrapper, search its string
//!    leaves for one that itself parses as the payload.
//! 3. **Span**: strict parse of the slice from the first `{`/`[` to the
//!    last matching `}`/`]`, then of the slice ending at the closer that
//!    balances the first opener, tolerating commentary around the JSON.
//! 4. **Repaired**: [`repair_json_text`] over the stage 1 and stage 3
//!    candidates, then strict parse.
//!
//! Only objects and arrays are accepted. Every stage uses a strict parser,
//! so truncated JSON is never accepted.

use std::sync::LazyLock;

use lexigrade_config::ExtractionConfig;
use regex_lite::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::repair::repair_json_text;
use crate::visit::find_string;
use crate::{EnrichmentError, EnrichmentResult};

static OPENING_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^```[A-Za-z0-9_+.-]*[ \t]*\r?\n?").expect("valid opening fence pattern")
});

static CLOSING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n?```$").expect("valid closing fence pattern"));

/// Which stage produced the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    Direct,
    Embedded,
    Span,
    Repaired,
}

/// A recovered JSON value and how it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub value: Value,
    pub strategy: ExtractionStrategy,
}

/// Permissive but bounded JSON extraction.
#[derive(Debug, Clone, Default)]
pub struct TextJsonExtractor {
    config: ExtractionConfig,
}

impl TextJsonExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Extract the first JSON object or array from `raw`.
    pub fn extract(&self, raw: &str) -> EnrichmentResult<Extracted> {
        self.extract_where(raw, |_| true)
    }

    /// Extract a JSON object or array, preferring one that satisfies `accept`.
    ///
    /// When a stage decodes a structure that `accept` rejects, its string
    /// leaves are searched for an accepted structure first; failing that the
    /// rejected structure is returned as-is so the caller can report why it
    /// is unusable.
    pub fn extract_where<F>(&self, raw: &str, accept: F) -> EnrichmentResult<Extracted>
    where
        F: Fn(&Value) -> bool,
    {
        let candidate = strip_fences(raw);
        if candidate.is_empty() {
            return Err(self.failure(raw, "enrichment text is empty"));
        }

        if let Some(found) = self.parse_stage(candidate, ExtractionStrategy::Direct, &accept) {
            return Ok(found);
        }

        let span = json_span(candidate).filter(|span| *span != candidate);
        let balanced = balanced_span(candidate).filter(|b| *b != candidate && Some(*b) != span);
        for slice in span.into_iter().chain(balanced) {
            if let Some(found) = self.parse_stage(slice, ExtractionStrategy::Span, &accept) {
                return Ok(found);
            }
        }

        if self.config.repair {
            info!("Strict parsing failed, attempting bounded JSON repair");
            for text in std::iter::once(candidate).chain(span) {
                let repaired = repair_json_text(text);
                if let Some(found) = self.parse_stage(&repaired, ExtractionStrategy::Repaired, &accept)
                {
                    return Ok(found);
                }
            }
        }

        let reason = if json_span(candidate).is_none() {
            "no JSON object or array found"
        } else if self.config.repair {
            "JSON-like text did not parse, even after repair"
        } else {
            "JSON-like text did not parse and repair is disabled"
        };
        Err(self.failure(raw, reason))
    }

    /// Search the string leaves of `value` for text that parses as an
    /// accepted JSON structure.
    pub fn find_embedded<F>(&self, value: &Value, accept: F) -> Option<Value>
    where
        F: Fn(&Value) -> bool,
    {
        let mut found = None;
        find_string(value, self.config.max_depth, |leaf| {
            match serde_json::from_str::<Value>(strip_fences(leaf)) {
                Ok(inner) if is_structure(&inner) && accept(&inner) => {
                    found = Some(inner);
                    true
                }
                _ => false,
            }
        });
        found
    }

    fn parse_stage<F>(&self, text: &str, strategy: ExtractionStrategy, accept: &F) -> Option<Extracted>
    where
        F: Fn(&Value) -> bool,
    {
        let value = match serde_json::from_str::<Value>(text) {
            Ok(value) => value,
            Err(e) => {
                debug!(?strategy, error = %e, "Strict JSON parse failed");
                return None;
            }
        };

        if is_structure(&value) && accept(&value) {
            debug!(?strategy, "Extracted enrichment JSON");
            return Some(Extracted { value, strategy });
        }

        if let Some(inner) = self.find_embedded(&value, accept) {
            debug!(outer = ?strategy, "Extracted enrichment JSON embedded in a string value");
            return Some(Extracted {
                value: inner,
                strategy: ExtractionStrategy::Embedded,
            });
        }

        is_structure(&value).then(|| {
            debug!(?strategy, "Extracted JSON that does not look like a payload");
            Extracted { value, strategy }
        })
    }

    fn failure(&self, raw: &str, reason: &str) -> EnrichmentError {
        warn!(reason, raw_len = raw.len(), "JSON extraction failed");
        EnrichmentError::Extraction {
            reason: reason.to_string(),
            excerpt: truncate_chars(raw, self.config.diagnostic_chars),
        }
    }
}

fn is_structure(value: &Value) -> bool {
    value.is_object() || value.is_array()
}

/// Trim whitespace and remove one leading and one trailing code fence.
pub(crate) fn strip_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if text.starts_with("```") {
        if let Some(m) = OPENING_FENCE.find(text) {
            text = &text[m.end()..];
        }
        if let Some(m) = CLOSING_FENCE.find(text) {
            text = &text[..m.start()];
        }
    }
    text.trim()
}

/// The slice from the first `{` or `[` to the last matching closer.
fn json_span(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let closer = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(closer)?;
    (end > start).then(|| &text[start..=end])
}

/// The slice from the first `{` or `[` to the closer that balances it,
/// ignoring brackets inside JSON strings. `None` when it never closes.
fn balanced_span(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, byte) in text[start..].bytes().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}
