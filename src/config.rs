//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.classlens.toml` files.

use crate::summary::{GroupingThresholds, SummaryOptions};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Backend store settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Proficiency grouping thresholds.
    #[serde(default)]
    pub thresholds: ThresholdsConfig,

    /// Summary computation settings.
    #[serde(default)]
    pub summary: SummaryConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "summary_report.md".to_string()
}

/// Backend store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend store base URL.
    #[serde(default = "default_backend_url")]
    pub url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_backend_url() -> String {
    "http://127.0.0.1:3011".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Accuracy cutoffs for the reteach / practice / extend tiers.
///
/// Omitted keys keep their defaults, so a file may override just one
/// threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdsConfig {
    /// Accuracy below this lands a student in the reteach group.
    #[serde(default = "default_reteach_max")]
    pub reteach_max: f64,

    /// Accuracy below this (and at least reteach_max) lands in practice.
    #[serde(default = "default_practice_max")]
    pub practice_max: f64,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            reteach_max: default_reteach_max(),
            practice_max: default_practice_max(),
        }
    }
}

fn default_reteach_max() -> f64 {
    0.50
}

fn default_practice_max() -> f64 {
    0.80
}

/// Summary computation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// How many lowest/highest standards to surface.
    #[serde(default = "default_top_tags_count")]
    pub top_tags_count: usize,

    /// Item count below which the report carries a reliability caveat.
    #[serde(default = "default_min_sample_size_warning")]
    pub min_sample_size_warning: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            top_tags_count: default_top_tags_count(),
            min_sample_size_warning: default_min_sample_size_warning(),
        }
    }
}

fn default_top_tags_count() -> usize {
    10
}

fn default_min_sample_size_warning() -> usize {
    5
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Maximum students listed per group table.
    #[serde(default = "default_max_group_rows")]
    pub max_group_rows: usize,

    /// Include the per-item section.
    #[serde(default = "default_true")]
    pub include_items: bool,

    /// Include the per-student section.
    #[serde(default = "default_true")]
    pub include_students: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            max_group_rows: default_max_group_rows(),
            include_items: true,
            include_students: true,
        }
    }
}

fn default_max_group_rows() -> usize {
    20
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".classlens.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.backend_url {
            self.backend.url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.backend.timeout_seconds = timeout;
        }

        if let Some(reteach_max) = args.reteach_max {
            self.thresholds.reteach_max = reteach_max;
        }
        if let Some(practice_max) = args.practice_max {
            self.thresholds.practice_max = practice_max;
        }
        if let Some(top_tags) = args.top_tags {
            self.summary.top_tags_count = top_tags;
        }

        if let Some(ref output) = args.output {
            self.general.output = output.to_string_lossy().to_string();
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Validate the merged configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.thresholds.reteach_max) {
            return Err("reteach_max must be between 0.0 and 1.0".to_string());
        }
        if !(0.0..=1.0).contains(&self.thresholds.practice_max) {
            return Err("practice_max must be between 0.0 and 1.0".to_string());
        }
        if self.thresholds.reteach_max > self.thresholds.practice_max {
            return Err("reteach_max must not exceed practice_max".to_string());
        }
        if self.backend.timeout_seconds == 0 {
            return Err("timeout_seconds must be at least 1".to_string());
        }

        Ok(())
    }

    /// Build the engine options from the merged configuration.
    pub fn summary_options(&self) -> SummaryOptions {
        SummaryOptions {
            thresholds: GroupingThresholds {
                reteach_max: self.thresholds.reteach_max,
                practice_max: self.thresholds.practice_max,
            },
            top_tags_count: self.summary.top_tags_count,
            min_sample_size_warning: self.summary.min_sample_size_warning,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
