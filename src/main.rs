//! Motor Sentinel - batch motor anomaly detection
//!
//! # Usage
//!
//! ```bash
//! # Analyse the configured sample file with the configured model
//! cargo run --release
//!
//! # Analyse a specific file and save the full record
//! ./motor-sentinel data/measures.csv --output motor_analysis_latest.json
//!
//! # Use a different model and a smaller plot budget
//! ./motor-sentinel data/measures.csv --model models/v2.json --max-points 500
//! ```
//!
//! # Environment Variables
//!
//! - `MOTOR_SENTINEL_CONFIG`: Path to a TOML config file
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use motor_sentinel::{
    AnalysisConfig, AnalysisOptions, AnalysisRecord, AnalysisReport, InputSource, MotorAnalyzer,
};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "motor-sentinel")]
#[command(about = "Motor anomaly detection from reconstruction error")]
#[command(version)]
struct CliArgs {
    /// CSV file to analyse (default: the configured sample file)
    data_path: Option<PathBuf>,

    /// Model artifact (JSON), overrides [model] path
    #[arg(long, value_name = "PATH")]
    model: Option<PathBuf>,

    /// TOML config file, overrides the MOTOR_SENTINEL_CONFIG search
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Maximum plotted points per series
    #[arg(long, value_name = "N")]
    max_points: Option<usize>,

    /// Write the JSON result record to this file
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Write single-line JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,
}

// ============================================================================
// Output
// ============================================================================

fn print_summary(report: &AnalysisReport) {
    let summary = &report.anomaly_summary;

    println!();
    println!("=== Analysis Results ===");
    println!("Timestamp: {}", report.timestamp);
    println!("Total records: {}", summary.total_records);
    println!(
        "Anomalies detected: {} ({:.2}%)",
        summary.anomaly_count, summary.anomaly_percentage
    );

    println!();
    println!("=== Temperature Analysis ===");
    for (column, stats) in &report.temperature_analysis {
        println!("{column}:");
        println!("  Average: {:.2}", stats.mean);
        println!("  Range: {:.2} - {:.2}", stats.min, stats.max);
        println!("  Last reading: {:.2}", stats.last);
        println!("  Anomalies: {}", stats.anomalies);
    }

    if !summary.parameter_anomalies.is_empty() {
        println!();
        println!("=== Parameter Anomalies ===");
        for (column, count) in &summary.parameter_anomalies {
            println!("{column}: {count} anomalies");
        }
    }

    let quality = &report.data_quality;
    if quality.reduced_confidence {
        println!();
        println!("=== Data Quality ===");
        if !quality.columns_missing.is_empty() {
            println!("Missing model columns: {}", quality.columns_missing.join(", "));
        }
        if !quality.columns_fully_missing.is_empty() {
            println!("Columns without values: {}", quality.columns_fully_missing.join(", "));
        }
        println!(
            "Values coerced: {}, values filled: {}",
            quality.values_coerced, quality.values_filled
        );
    }
}

fn write_record(record: &AnalysisRecord, path: &Path, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(record)
    } else {
        serde_json::to_string_pretty(record)
    }
    .context("Failed to serialize analysis record")?;

    std::fs::write(path, json)
        .with_context(|| format!("Failed to write results to {}", path.display()))?;
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<ExitCode> {
    // Logs go to stderr so stdout carries only the summary
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    let config = match &args.config {
        Some(path) => AnalysisConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AnalysisConfig::load(),
    };

    let mut options = AnalysisOptions::from_config(&config);
    if let Some(n) = args.max_points {
        options = options.with_max_data_points(n);
    }
    let model_path = args.model.unwrap_or_else(|| config.model.path.clone());

    println!("Motor Anomaly Detection System");
    println!("==============================");
    match &args.data_path {
        Some(path) => println!("Using provided data file: {}", path.display()),
        None => println!(
            "Using default data file: {}",
            options.default_data_path.display()
        ),
    }
    println!("Analyzing motor data...");

    info!(model = %model_path.display(), max_points = options.max_data_points, "Starting analysis");
    let record = MotorAnalyzer::analyze_with_model_path(
        &model_path,
        InputSource::from_parts(args.data_path, None),
        &options,
    );

    if let Some(path) = &args.output {
        write_record(&record, path, args.compact)?;
    }

    match &record {
        AnalysisRecord::Success(report) => {
            print_summary(report);
            if let Some(path) = &args.output {
                println!();
                println!("Results saved to {}", path.display());
            }
            Ok(ExitCode::SUCCESS)
        }
        AnalysisRecord::Error { message } => {
            println!("Error: {message}");
            Ok(ExitCode::FAILURE)
        }
    }
}
