//! CLI entry point for the exam rater.
//!
//! Provides subcommands for exporting failure and borderline reports from a
//! multi-header exam sheet, showing them in the log, printing a JSON summary,
//! and simulating a changed TEE score for one student.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use exam_rater::analyzers::analyzer::{GradedSheet, analyze, build_reports};
use exam_rater::analyzers::filters::TeeBasis;
use exam_rater::analyzers::simulate::simulate;
use exam_rater::config::ReportConfig;
use exam_rater::output::{PREVIEW_ROWS, append_record, print_json, print_pretty, print_table, write_report};
use exam_rater::stats::{ReportStats, Summary};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "exam_rater")]
#[command(about = "A tool to report failing and borderline students from exam sheets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that grades a sheet.
#[derive(Args)]
struct GradingArgs {
    /// Exam sheet CSV export
    #[arg(value_name = "FILE")]
    file: String,

    /// Optional JSON config file (falls back to EXAM_RATER_CONFIG)
    #[arg(long)]
    config: Option<String>,

    /// Lower bound of the borderline band (inclusive)
    #[arg(long)]
    low: Option<f64>,

    /// Upper bound of the borderline band (inclusive)
    #[arg(long)]
    high: Option<f64>,

    /// Compare raw TEE scores or TEE percentages against the band
    #[arg(long, value_enum)]
    tee_basis: Option<TeeBasis>,
}

#[derive(Subcommand)]
enum Commands {
    /// Export the failure and borderline reports as CSV files
    Report {
        #[command(flatten)]
        grading: GradingArgs,

        /// Directory to write the reports to
        #[arg(short, long, default_value = "reports")]
        output_dir: String,

        /// Also write gzip-compressed copies of the reports
        #[arg(long, default_value_t = false)]
        gzip: bool,

        /// Optional: CSV file to append run statistics to
        #[arg(long)]
        stats_log: Option<String>,
    },
    /// Log the failure and borderline tables
    Show {
        #[command(flatten)]
        grading: GradingArgs,

        /// Maximum rows to show per table
        #[arg(short, long, default_value_t = PREVIEW_ROWS)]
        limit: usize,
    },
    /// Print a JSON summary of the graded sheet
    Summary {
        #[command(flatten)]
        grading: GradingArgs,
    },
    /// Recompute one student's total with a changed TEE score
    Simulate {
        #[command(flatten)]
        grading: GradingArgs,

        /// Student id as it appears in the Add.ID column
        #[arg(long)]
        student: String,

        /// Subject name, with spaces or underscores
        #[arg(long)]
        subject: String,

        /// Marks to add to the TEE score (may be negative)
        #[arg(long, allow_hyphen_values = true)]
        delta: f64,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/exam_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("exam_rater.log"));

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
        Commands::Report {
            grading,
            output_dir,
            gzip,
            stats_log,
        } => {
            let (graded, config) = load_and_grade(&grading)?;
            let reports = build_reports(&graded, &config);

            let dir = Path::new(&output_dir);
            for report in reports.iter() {
                write_report(dir, report, config.range(), gzip)?;
            }

            let stats = ReportStats::from_graded(&graded, &reports).with_source(&grading.file);
            print_pretty(&stats);
            info!(
                students = stats.students,
                subjects = stats.subjects,
                pass_pct = stats.pass_pct(),
                "Run complete"
            );

            if let Some(path) = stats_log {
                append_record(&path, &stats)?;
            }
        }
        Commands::Show { grading, limit } => {
            let (graded, config) = load_and_grade(&grading)?;
            let reports = build_reports(&graded, &config);

            print_table("Failed students", &reports.failures, limit);
            print_table("TEE borderline", &reports.tee_borderline, limit);
            print_table("Final marks borderline", &reports.final_borderline, limit);
        }
        Commands::Summary { grading } => {
            let (graded, config) = load_and_grade(&grading)?;
            let reports = build_reports(&graded, &config);

            let summary = Summary::new(&graded, &reports);
            print_json(&summary)?;
        }
        Commands::Simulate {
            grading,
            student,
            subject,
            delta,
        } => {
            let (graded, _) = load_and_grade(&grading)?;
            let result = simulate(
                &graded.table,
                &graded.identity,
                &graded.max_marks,
                &student,
                &subject,
                delta,
            )?;
            print_json(&result)?;
        }
    }

    Ok(())
}

/// Resolves the config and grades the sheet at `args.file`.
#[tracing::instrument(skip(args), fields(file = %args.file))]
fn load_and_grade(args: &GradingArgs) -> Result<(GradedSheet, ReportConfig)> {
    let config_path = args
        .config
        .clone()
        .or_else(|| std::env::var("EXAM_RATER_CONFIG").ok());
    let config = match config_path {
        Some(path) => {
            info!(path = %path, "Loading report config");
            ReportConfig::load(&path)?
        }
        None => ReportConfig::default(),
    };
    let config = config.with_overrides(args.low, args.high, args.tee_basis)?;

    let bytes = std::fs::read(&args.file)?;
    let graded = analyze(&bytes, &config)?;
    Ok((graded, config))
}
