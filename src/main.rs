//! ClassLens - assignment performance summaries for K-12 assessments
//!
//! A CLI tool that loads assessment items and student responses for one
//! assignment, computes per-item / per-standard / per-student accuracy
//! with reteach / practice / extend groupings, and writes a Markdown or
//! JSON report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (fetch, config, no items, write failure)
//!   2 - Reteach group reached the --fail-on-reteach threshold

mod cli;
mod config;
mod models;
mod report;
mod store;
mod summary;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::Config;
use models::{Item, StudentResponse, SummaryInput};
use report::ReportOptions;
use std::path::PathBuf;
use summary::{compute_assignment_summary, SummaryError};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("ClassLens v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    // Run the summary workflow
    match run_summary(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Summary failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .classlens.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(".classlens.toml");

    if path.exists() {
        eprintln!("⚠️  .classlens.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .classlens.toml")?;

    println!("✅ Created .classlens.toml with default settings.");
    println!("   Edit it to customize thresholds, backend URL, and report layout.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete summary workflow. Returns exit code (0 or 2).
async fn run_summary(args: Args) -> Result<i32> {
    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    if let Err(e) = config.validate() {
        anyhow::bail!("Invalid configuration: {}", e);
    }

    let assignment_id = args.assignment_id().to_string();

    // Step 1: Acquire items and responses
    println!("📥 Loading assignment: {}", assignment_id);
    let (fetched_title, items, responses) = acquire_input(&args, &config, &assignment_id).await?;
    info!("Loaded {} items and {} responses", items.len(), responses.len());

    let input = SummaryInput {
        assignment_id: assignment_id.clone(),
        assignment_title: args.title.clone().or(fetched_title),
        items,
        responses,
    };

    // Step 2: Compute the summary
    println!("🧮 Computing summary...");
    let options = config.summary_options();
    let summary = match compute_assignment_summary(&input, &options) {
        Ok(summary) => summary,
        Err(SummaryError::NoItems) => {
            anyhow::bail!("Assignment not found or has no items: {}", assignment_id)
        }
    };

    // Step 3: Render and save the report
    println!("📝 Generating report...");
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.general.output));

    let rendered = match args.format {
        OutputFormat::Json => report::generate_json_report(&summary)?,
        OutputFormat::Markdown => {
            report::generate_markdown_report(&summary, &ReportOptions::from(&config))
        }
    };

    std::fs::write(&output_path, &rendered)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    // Print summary
    let stats = &summary.overall_stats;
    println!("\n📊 Assignment Summary:");
    println!("   Students: {}", stats.total_students);
    println!(
        "   Attempts: {} ({} correct)",
        stats.total_attempts, stats.total_correct
    );
    println!(
        "   Overall accuracy: {:.1}%",
        stats.overall_accuracy * 100.0
    );
    println!(
        "   - 🔴 Reteach: {} | 🟡 Practice: {} | 🟢 Extend: {}",
        summary.groups.reteach.len(),
        summary.groups.practice.len(),
        summary.groups.extend.len()
    );
    if stats.total_items < options.min_sample_size_warning {
        println!(
            "   ⚠️  Only {} item(s); results may not be reliable.",
            stats.total_items
        );
    }
    println!(
        "\n✅ Summary complete! Report saved to: {}",
        output_path.display()
    );

    // Check --fail-on-reteach threshold
    if let Some(limit) = args.fail_on_reteach {
        let reteach_count = summary.groups.reteach.len();
        if reteach_count >= limit {
            eprintln!(
                "\n⛔ {} student(s) in the reteach group (limit {}). Failing (exit code 2).",
                reteach_count, limit
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Acquire items and responses from local files or the backend store.
async fn acquire_input(
    args: &Args,
    config: &Config,
    assignment_id: &str,
) -> Result<(Option<String>, Vec<Item>, Vec<StudentResponse>)> {
    if let (Some(items_path), Some(responses_path)) = (&args.items, &args.responses) {
        info!(
            "Using local files: {} / {}",
            items_path.display(),
            responses_path.display()
        );
        let loaded = store::load_items(items_path)?;
        let responses = store::load_responses(responses_path)?;
        return Ok((loaded.title, loaded.items, responses));
    }

    info!("Fetching from backend: {}", config.backend.url);
    let client = store::StoreClient::new(&config.backend.url, config.backend.timeout_seconds)?;
    let (record, responses) = futures::try_join!(
        client.fetch_assignment(assignment_id),
        client.fetch_responses(assignment_id)
    )?;

    Ok((record.title, record.items, responses))
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .classlens.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
