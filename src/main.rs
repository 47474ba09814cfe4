//! CLI entry point for the grade rater.
//!
//! Loads the course configuration, ingests a roster CSV, grades every
//! student, and reports and exports the resulting statistics.

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use grade_rater::analyzers::report::build_report;
use grade_rater::config::Config;
use grade_rater::ingest::read_roster;
use grade_rater::output::{
    export_at_risk, export_by_section, log_json, log_outliers, log_section_comparison,
    log_student_list, log_summary, write_report_json,
};
use grade_rater::{
    Field, StudentRecord, compute_percentile, compute_stats, find_outliers, grade_record,
    identify_at_risk,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "grade_rater")]
#[command(about = "Compute weighted course grades and roster statistics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: grade, report and export
    Analyze {
        /// Configuration file
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,

        /// Roster CSV (defaults to <input_folder>/input.csv from the config)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Directory for exported files (defaults to output_folder from the config)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Number of top performers to report
        #[arg(short = 'n', long, default_value_t = 10)]
        top: usize,

        /// Only log the report, do not write any files
        #[arg(long, default_value_t = false)]
        no_export: bool,

        /// Also log the full report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Log statistics, percentiles and outliers for a single field
    Stats {
        /// Roster CSV
        #[arg(short, long)]
        input: PathBuf,

        /// Configuration file; built-in weights and scale are used if omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Field to analyze
        #[arg(short, long, value_enum, default_value_t = Field::FinalGrade)]
        field: Field,

        /// Percentiles to compute (0-100)
        #[arg(short, long, default_values_t = [25.0, 50.0, 75.0])]
        percentile: Vec<f64>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/grade_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("grade_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            config,
            input,
            output_dir,
            top,
            no_export,
            json,
        } => {
            let config = Config::load(&config)?;
            let input = input.unwrap_or_else(|| config.paths.input_file());
            let output_dir = output_dir.unwrap_or_else(|| config.paths.output_folder.clone());
            analyze(&config, &input, &output_dir, top, !no_export, json)?;
        }
        Commands::Stats {
            input,
            config,
            field,
            percentile,
        } => {
            let config = match config {
                Some(path) => Config::load(path)?,
                None => Config::default(),
            };
            field_stats(&config, &input, field, &percentile)?;
        }
    }

    Ok(())
}

/// Grades every record, keeping records that fail validation ungraded.
fn grade_all(records: &[StudentRecord], config: &Config) -> Vec<StudentRecord> {
    records
        .iter()
        .map(
            |r| match grade_record(r, &config.weights, &config.grade_scale) {
                Ok(graded) => graded,
                Err(e) => {
                    warn!(student_id = %r.student_id, error = %e, "Record left ungraded");
                    r.clone()
                }
            },
        )
        .collect()
}

/// Runs the whole pipeline over one roster.
#[tracing::instrument(
    skip(config, input, output_dir),
    fields(input = %input.display(), output_dir = %output_dir.display())
)]
fn analyze(
    config: &Config,
    input: &Path,
    output_dir: &Path,
    top: usize,
    export: bool,
    json: bool,
) -> Result<()> {
    let start = Instant::now();

    let roster = read_roster(input)?;
    if !roster.warnings.is_empty() {
        warn!(
            count = roster.warnings.len(),
            "Ingestion produced warnings"
        );
    }

    let graded = grade_all(&roster.records, config);
    let report = build_report(
        &graded,
        &config.grade_scale,
        &config.thresholds,
        top,
        Utc::now(),
    );

    log_summary(&report);
    log_section_comparison(&report.sections);
    if !report.at_risk.is_empty() {
        log_student_list(
            &format!("At-risk students (grade < {})", report.at_risk_threshold),
            &report.at_risk,
        );
    }
    log_student_list(&format!("Top {top} performers"), &report.top_performers);
    log_outliers(report.outliers.as_ref());
    if json {
        log_json(&report)?;
    }

    if export {
        let sections = export_by_section(output_dir, &graded)?;
        info!(sections, "Section files exported");

        let at_risk = identify_at_risk(&graded, config.thresholds.at_risk);
        export_at_risk(output_dir.join("at_risk_students.csv"), &at_risk)?;

        write_report_json(output_dir.join("summary.json"), &report)?;
    }

    info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Pipeline completed"
    );
    Ok(())
}

/// Logs summary, percentiles and IQR outliers of one field.
fn field_stats(config: &Config, input: &Path, field: Field, percentiles: &[f64]) -> Result<()> {
    let roster = read_roster(input)?;
    let graded = grade_all(&roster.records, config);

    match compute_stats(&graded, field) {
        Ok(s) => info!(
            %field,
            count = s.count,
            mean = s.mean,
            median = s.median,
            std_dev = s.std_dev,
            min = s.min,
            max = s.max,
            "Summary"
        ),
        Err(e) => {
            warn!(%field, error = %e, "Cannot summarize field");
            return Ok(());
        }
    }

    for &p in percentiles {
        match compute_percentile(&graded, field, p) {
            Ok(value) => info!(%field, percentile = p, value, "Percentile"),
            Err(e) => warn!(%field, percentile = p, error = %e, "Percentile skipped"),
        }
    }

    let outliers = find_outliers(&graded, field)?;
    info!(
        %field,
        lower_fence = outliers.lower_fence,
        upper_fence = outliers.upper_fence,
        count = outliers.records.len(),
        "Outliers"
    );
    for r in &outliers.records {
        info!(student_id = %r.student_id, value = field.value(r), "Outlier");
    }

    Ok(())
}
