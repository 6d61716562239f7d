//! Configuration loading, validation, and management for Lexigrade.
//!
//! Loads configuration from `~/.lexigrade/config.toml` (or the path in
//! `LEXIGRADE_CONFIG`) with environment variable overrides. The grading
//! and enrichment crates never read this themselves; the CLI hands each
//! section to them as a plain parameter.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.lexigrade/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Local grading settings
    #[serde(default)]
    pub grading: GradingConfig,

    /// JSON extraction settings for enrichment text
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// The closed study-material catalog
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingConfig {
    /// Skill label used for answer-key entries without a skill.
    #[serde(default = "default_unknown_label")]
    pub unknown_label: String,

    /// Maximum number of weak topics reported.
    #[serde(default = "default_weak_topic_limit")]
    pub weak_topic_limit: usize,

    /// Maximum number of weak topics any one skill contributes.
    #[serde(default = "default_topics_per_skill")]
    pub topics_per_skill: usize,
}

fn default_unknown_label() -> String {
    "Unknown".into()
}
fn default_weak_topic_limit() -> usize {
    3
}
fn default_topics_per_skill() -> usize {
    2
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            unknown_label: default_unknown_label(),
            weak_topic_limit: default_weak_topic_limit(),
            topics_per_skill: default_topics_per_skill(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Recursion bound for the nested-string search.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Number of characters of raw text kept in extraction diagnostics.
    #[serde(default = "default_diagnostic_chars")]
    pub diagnostic_chars: usize,

    /// Whether the bounded repair pass runs before giving up.
    #[serde(default = "default_true")]
    pub repair: bool,
}

fn default_max_depth() -> usize {
    32
}
fn default_diagnostic_chars() -> usize {
    2000
}
fn default_true() -> bool {
    true
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            diagnostic_chars: default_diagnostic_chars(),
            repair: true,
        }
    }
}

/// Skill → ordered material names. Only these strings may ever appear in a
/// plan's `materials`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Skill whose list is used for unknown or missing skills.
    #[serde(default = "default_fallback_skill")]
    pub fallback_skill: String,

    #[serde(default = "default_materials")]
    pub materials: IndexMap<String, Vec<String>>,
}

fn default_fallback_skill() -> String {
    "Grammar".into()
}

fn default_materials() -> IndexMap<String, Vec<String>> {
    let entries: [(&str, &[&str]); 5] = [
        (
            "Grammar",
            &[
                "Grammar & Vocabulary Expansion - Trung cấp",
                "Advanced Grammar Review & Traps in TOEIC",
            ],
        ),
        (
            "Vocabulary",
            &[
                "Essential Vocabulary - Chủ đề công việc",
                "TOEIC Vocabulary Practice - Intermediate",
            ],
        ),
        (
            "Listening",
            &[
                "Listening Mastery – Chiến thuật nghe nâng cao",
                "Listening Practice A – TOEIC Part 3 & 4",
                "Listening Starter – TOEIC Part 1 & 2",
            ],
        ),
        (
            "Reading",
            &[
                "Reading Mastery – Đọc hiểu & Suy luận ý chính",
                "Reading Practice A – TOEIC Part 6 & 7",
                "Reading Starter – TOEIC Part 5 & 6",
            ],
        ),
        (
            "Speaking",
            &[
                "Speaking Workshop - Everyday Topics",
                "Pronunciation & Fluency Training",
            ],
        ),
    ];
    entries
        .into_iter()
        .map(|(skill, list)| {
            (
                skill.to_string(),
                list.iter().map(|m| m.to_string()).collect(),
            )
        })
        .collect()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            fallback_skill: default_fallback_skill(),
            materials: default_materials(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path.
    ///
    /// `LEXIGRADE_CONFIG` replaces the default path; other `LEXIGRADE_*`
    /// variables override individual settings (see [`AppConfig::apply_overrides`]).
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("LEXIGRADE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::config_dir().join("config.toml"));
        Self::load_with_env(&path)
    }

    /// Load from a specific path, then apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup:
    /// - `LEXIGRADE_EXTRACTION_REPAIR` (`true`/`false`/`1`/`0`)
    /// - `LEXIGRADE_FALLBACK_SKILL`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = lookup("LEXIGRADE_EXTRACTION_REPAIR") {
            match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => self.extraction.repair = true,
                "false" | "0" | "no" => self.extraction.repair = false,
                other => tracing::warn!("Ignoring LEXIGRADE_EXTRACTION_REPAIR={other}"),
            }
        }

        if let Some(skill) = lookup("LEXIGRADE_FALLBACK_SKILL") {
            self.catalog.fallback_skill = skill.trim().to_string();
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".lexigrade")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grading.weak_topic_limit == 0 {
            return Err(ConfigError::ValidationError(
                "grading.weak_topic_limit must be at least 1".into(),
            ));
        }

        if self.grading.topics_per_skill == 0 {
            return Err(ConfigError::ValidationError(
                "grading.topics_per_skill must be at least 1".into(),
            ));
        }

        if self.extraction.max_depth == 0 {
            return Err(ConfigError::ValidationError(
                "extraction.max_depth must be at least 1".into(),
            ));
        }

        if self.catalog.materials.is_empty() {
            return Err(ConfigError::ValidationError(
                "catalog.materials must not be empty".into(),
            ));
        }

        if let Some((skill, _)) = self
            .catalog
            .materials
            .iter()
            .find(|(_, list)| list.is_empty())
        {
            return Err(ConfigError::ValidationError(format!(
                "catalog.materials.{skill} must list at least one material"
            )));
        }

        if !self
            .catalog
            .materials
            .contains_key(&self.catalog.fallback_skill)
        {
            return Err(ConfigError::ValidationError(format!(
                "catalog.fallback_skill '{}' is not a catalog skill",
                self.catalog.fallback_skill
            )));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `lexigrade config --show-default`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
