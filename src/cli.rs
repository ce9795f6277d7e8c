//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// ClassLens - assignment performance summaries for K-12 assessments
///
/// Compute per-item, per-standard, and per-student accuracy for one
/// assignment and group students into reteach / practice / extend
/// tiers. Markdown/JSON reports. Built in Rust.
///
/// Examples:
///   classlens --assignment unit3-quiz
///   classlens --assignment unit3-quiz --reteach-max 0.6 --format json
///   classlens --assignment demo --items fixtures/items.json --responses fixtures/responses.json
///   classlens --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Assignment identifier to summarize
    ///
    /// Not required when using --init-config.
    #[arg(short, long, value_name = "ID", required_unless_present = "init_config")]
    pub assignment: Option<String>,

    /// Override the assignment title shown in the report
    #[arg(long, value_name = "TITLE")]
    pub title: Option<String>,

    /// Local JSON file with assessment items
    ///
    /// Either a bare array or a { "title": ..., "items": [...] }
    /// envelope. Used together with --responses instead of the backend.
    #[arg(long, value_name = "FILE", requires = "responses")]
    pub items: Option<PathBuf>,

    /// Local JSON file with student responses (a bare array)
    #[arg(long, value_name = "FILE", requires = "items")]
    pub responses: Option<PathBuf>,

    /// Backend store base URL
    ///
    /// Defaults to the config file value or http://127.0.0.1:3011.
    #[arg(long, value_name = "URL", env = "CLASSLENS_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Request timeout in seconds for backend fetches
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Accuracy below this lands a student in the reteach group
    ///
    /// A fraction in [0, 1]. Default: from config or 0.50.
    #[arg(long, value_name = "FRACTION")]
    pub reteach_max: Option<f64>,

    /// Accuracy below this (and at least reteach-max) lands in practice
    ///
    /// A fraction in [0, 1]. Default: from config or 0.80.
    #[arg(long, value_name = "FRACTION")]
    pub practice_max: Option<f64>,

    /// How many lowest/highest standards to surface
    #[arg(long, value_name = "COUNT")]
    pub top_tags: Option<usize>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Fail when the reteach group reaches this many students
    ///
    /// Useful for CI-style gates on benchmark assignments. Exit code 2
    /// when the threshold is reached.
    #[arg(long, value_name = "COUNT")]
    pub fail_on_reteach: Option<usize>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .classlens.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .classlens.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the assignment id, empty if not set (should be validated first).
    pub fn assignment_id(&self) -> &str {
        self.assignment.as_deref().unwrap_or("")
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Validate backend URL format
        if let Some(ref url) = self.backend_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Backend URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // Validate threshold ranges; the merged ordering check happens
        // at the config layer
        if let Some(reteach_max) = self.reteach_max {
            if !(0.0..=1.0).contains(&reteach_max) {
                return Err("reteach-max must be between 0.0 and 1.0".to_string());
            }
        }
        if let Some(practice_max) = self.practice_max {
            if !(0.0..=1.0).contains(&practice_max) {
                return Err("practice-max must be between 0.0 and 1.0".to_string());
            }
        }
        if let (Some(reteach_max), Some(practice_max)) = (self.reteach_max, self.practice_max) {
            if reteach_max > practice_max {
                return Err("reteach-max must not exceed practice-max".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        // Validate the reteach gate if provided
        if let Some(limit) = self.fail_on_reteach {
            if limit == 0 {
                return Err("fail-on-reteach must be at least 1".to_string());
            }
        }

        // Validate local input files if provided
        for (label, path) in [("Items", &self.items), ("Responses", &self.responses)] {
            if let Some(path) = path {
                if !path.exists() {
                    return Err(format!("{} file does not exist: {}", label, path.display()));
                }
                if !path.is_file() {
                    return Err(format!("{} path is not a file: {}", label, path.display()));
                }
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            assignment: Some("unit3-quiz".to_string()),
            title: None,
            items: None,
            responses: None,
            backend_url: None,
            timeout: None,
            reteach_max: None,
            practice_max: None,
            top_tags: None,
            output: None,
            format: OutputFormat::Markdown,
            fail_on_reteach: None,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_invalid_backend_url() {
        let mut args = make_args();
        args.backend_url = Some("127.0.0.1:3011".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_threshold_range() {
        let mut args = make_args();
        args.reteach_max = Some(1.5);
        assert!(args.validate().is_err());

        args.reteach_max = Some(0.9);
        args.practice_max = Some(0.6);
        assert!(args.validate().is_err());

        args.reteach_max = Some(0.4);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_items_file() {
        let mut args = make_args();
        args.items = Some(PathBuf::from("/nonexistent/items.json"));
        args.responses = Some(PathBuf::from("/nonexistent/responses.json"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
