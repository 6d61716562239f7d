//! `lexigrade extract` — Run the JSON extractor on its own.

use std::path::Path;

use lexigrade_enrichment::{Extracted, ExtractionStrategy, SchemaGate, TextJsonExtractor};
use serde::Serialize;
use serde_json::Value;

use super::{load_config, read_text, unwrap_envelope};

#[derive(Serialize)]
struct ExtractOutput<'a> {
    strategy: ExtractionStrategy,
    /// Whether the value carries the mandatory enrichment keys.
    enrichment_candidate: bool,
    value: &'a Value,
}

pub async fn run(config_path: Option<&Path>, input: &Path, envelope: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let mut text = read_text(input).await?;
    if envelope {
        text = unwrap_envelope(&text, config.extraction.max_depth)?;
    }

    let extractor = TextJsonExtractor::new(config.extraction);
    let extracted = extractor.extract_where(&text, SchemaGate::is_candidate)?;
    println!("{}", render(&extracted)?);
    Ok(())
}

fn render(extracted: &Extracted) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&ExtractOutput {
        strategy: extracted.strategy,
        enrichment_candidate: SchemaGate::is_candidate(&extracted.value),
        value: &extracted.value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_names_strategy() {
        let extracted = TextJsonExtractor::default()
            .extract("```json\n{\"total_score\": 1, \"per_question\": []}\n```")
            .unwrap();
        let value: Value = serde_json::from_str(&render(&extracted).unwrap()).unwrap();
        assert_eq!(value["strategy"], "direct");
        assert_eq!(value["enrichment_candidate"], true);
        assert_eq!(value["value"]["total_score"], 1);
    }
}
