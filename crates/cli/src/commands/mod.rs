pub mod catalog;
pub mod config_cmd;
pub mod extract;
pub mod grade;

use std::path::Path;

use lexigrade_config::AppConfig;
use lexigrade_enrichment::response_text;

/// Load the config from `path` when given, else from the default location.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => AppConfig::load_with_env(path),
        None => AppConfig::load(),
    };
    config.map_err(|e| format!("Failed to load config: {e}").into())
}

pub async fn read_text(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("Failed to read {}: {e}", path.display()).into())
}

/// Pull the generated text out of a provider response body.
pub fn unwrap_envelope(body: &str, max_depth: usize) -> Result<String, Box<dyn std::error::Error>> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| format!("Response body is not JSON: {e}"))?;
    response_text(&value, max_depth)
        .map(str::to_string)
        .ok_or_else(|| "Response body contains no text".into())
}
