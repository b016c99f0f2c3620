//! MyFlow CLI - Command-line interface for the MyFlow engine
//!
//! Commands:
//! - analyze: Full analysis of a batch of daily logs
//! - score: Per-day load breakdown only
//! - validate: Check every log and report all problems
//! - schema: Describe the input and output formats

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use myflow_engine::schema::{AnalysisRequest, RawLogAdapter, ValidationReport};
use myflow_engine::{AnalysisEngine, ComputeError, EngineConfig, ENGINE_VERSION};

/// MyFlow - Personal-baseline wellness analysis
#[derive(Parser)]
#[command(name = "myflow")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Analyze daily wellness logs against your own baseline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify the evaluation day and rank patterns over the whole series
    Analyze {
        #[command(flatten)]
        io: IoArgs,

        #[command(flatten)]
        overrides: OverrideArgs,
    },

    /// Compute the per-day load breakdown only
    Score {
        #[command(flatten)]
        io: IoArgs,

        #[command(flatten)]
        overrides: OverrideArgs,
    },

    /// Check every log and report all malformed entries
    Validate {
        /// Input file path (use - for stdin)
        #[arg(default_value = "-")]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(clap::Args)]
struct IoArgs {
    /// Input file path (use - for stdin)
    #[arg(default_value = "-")]
    input: PathBuf,

    /// Output file path (use - for stdout)
    #[arg(short, long, default_value = "-")]
    output: PathBuf,

    /// Input format
    #[arg(long, default_value = "json")]
    input_format: InputFormat,

    /// Output format
    #[arg(long, default_value = "json-pretty")]
    output_format: OutputFormat,
}

#[derive(clap::Args)]
struct OverrideArgs {
    /// Engine configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Baseline window and minimum history in days
    #[arg(long)]
    window_days: Option<usize>,

    /// Day to classify (YYYY-MM-DD); defaults to the latest logged day
    #[arg(long)]
    evaluation_date: Option<NaiveDate>,

    /// Enable the sleep-deficit penalty for users whose history confirms it
    #[arg(long)]
    sleep_penalty: bool,
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// JSON array of logs, or an object with an "entries" array
    Json,
    /// Newline-delimited JSON (one log per line)
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (daily log)
    Input,
    /// Output schema (analysis report)
    Output,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr so stdout stays machine-readable. `RUST_LOG` overrides the default.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), MyflowCliError> {
    match cli.command {
        Commands::Analyze { io, overrides } => cmd_analyze(&io, &overrides),
        Commands::Score { io, overrides } => cmd_score(&io, &overrides),
        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),
        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

fn cmd_analyze(io: &IoArgs, overrides: &OverrideArgs) -> Result<(), MyflowCliError> {
    let (engine, request) = prepare(io, overrides)?;
    let report = engine.analyze_request(&request)?;
    write_output(&report, &io.output_format, &io.output)
}

fn cmd_score(io: &IoArgs, overrides: &OverrideArgs) -> Result<(), MyflowCliError> {
    let (engine, request) = prepare(io, overrides)?;
    let report = engine.score_request(&request)?;
    write_output(&report, &io.output_format, &io.output)
}

/// Build the engine and request. Flags override the request envelope, which
/// overrides the config file.
fn prepare(
    io: &IoArgs,
    overrides: &OverrideArgs,
) -> Result<(AnalysisEngine, AnalysisRequest), MyflowCliError> {
    let mut config = match &overrides.config {
        Some(path) => EngineConfig::from_json(&fs::read_to_string(path)?)?,
        None => EngineConfig::default(),
    };
    if overrides.sleep_penalty {
        config.sleep_penalty.enabled = true;
    }

    let input_data = read_input(&io.input)?;
    let request = build_request(&input_data, &io.input_format, overrides)?;

    debug!(entries = request.entries.len(), "read request");
    Ok((AnalysisEngine::new(config)?, request))
}

/// Parse the input and apply the flag overrides. An empty batch is passed
/// through so the engine reports it like any other short series.
fn build_request(
    input_data: &str,
    input_format: &InputFormat,
    overrides: &OverrideArgs,
) -> Result<AnalysisRequest, MyflowCliError> {
    let mut request = match input_format {
        InputFormat::Json => RawLogAdapter::parse_request(input_data)?,
        InputFormat::Ndjson => AnalysisRequest::new(RawLogAdapter::parse_ndjson(input_data)?),
    };

    if let Some(window_days) = overrides.window_days {
        request.window_days = Some(window_days);
    }
    if let Some(date) = overrides.evaluation_date {
        request.evaluation_date = Some(date);
    }
    Ok(request)
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), MyflowCliError> {
    let input_data = read_input(input)?;

    let report: ValidationReport = match input_format {
        InputFormat::Json => RawLogAdapter::validate_json(&input_data)?,
        InputFormat::Ndjson => RawLogAdapter::validate_ndjson(&input_data)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total entries:   {}", report.total_entries);
        println!("Valid entries:   {}", report.valid_entries);
        println!("Invalid entries: {}", report.invalid_entries);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Entry {} (date {}): {}",
                    err.index,
                    err.date.as_deref().unwrap_or("unknown"),
                    err.reason
                );
            }
        }
    }

    if report.is_valid() {
        Ok(())
    } else {
        Err(MyflowCliError::ValidationFailed(report.invalid_entries))
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), MyflowCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input: one JSON object per day");
                println!();
                println!("Required:");
                println!("- date: YYYY-MM-DD");
                println!("- physiological.sleep_hours: number, clamped to 0-24");
                println!("- cognitive_load.study_minutes: integer >= 0");
                println!("- emotional.stress: integer, clamped to 0-10");
                println!("- symptoms.tic_count: integer, clamped to 0-10");
                println!();
                println!("Optional:");
                println!("- screen.screen_time_hours: number (default 0)");
                println!("- social.social_conflict: boolean (default false)");
                println!("- custom: [{{ name, level 1-5, effect 1 or -1 }}]");
                println!("- journal: free text");
                println!();
                println!("Numbers may also be given as numeric strings.");
                println!("Batches are a JSON array, NDJSON, or {{ entries, window_days, evaluation_date }}.");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output: analysis report");
                println!();
                println!("- producer: {{ name, version, instance_id }}");
                println!("- computed_at_utc, window_days, days_analyzed");
                println!("- pacing_state: GREEN_LIGHT | HIGH_LOAD_WARNING | ADAPTIVE_PACING_ALERT | UNUSUAL_SPIKE");
                println!("- recommendation, evaluation_date, baseline_days");
                println!("- tnl_latest, tnl_threshold, tic_latest, tic_threshold");
                println!("- protective_factors: [{{ name, pct_tic_reduction, times_used, avg_tics_with, ... }}]");
                println!("- best_days: [{{ date, tnl, tic_count, protective_factors }}]");
                println!("- sleep_correlation: {{ r, optimal_sleep_hours, avg_sleep_hours, ... }}");
                println!("- sleep_vulnerability: {{ low_sleep_days, high_tic_low_sleep_days, ratio, vulnerable }}");
                println!("- per_day_breakdown: [{{ date, tnl, stress_component, study_component, ... }}]");
            }
        }
    }
    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, MyflowCliError> {
    if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            warn!("reading logs from an interactive terminal; end input with Ctrl-D");
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn write_output<T: Serialize>(
    value: &T,
    format: &OutputFormat,
    output: &Path,
) -> Result<(), MyflowCliError> {
    let output_data = match format {
        OutputFormat::Json => serde_json::to_string(value)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(value)?,
    };

    if output.to_string_lossy() == "-" {
        println!("{}", output_data);
    } else {
        fs::write(output, output_data + "\n")?;
    }
    Ok(())
}

fn get_input_json_schema() -> String {
    let number = serde_json::json!({ "type": ["number", "string"] });
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "myflow.daily_log",
        "description": "One day of the wellness log",
        "type": "object",
        "required": ["date", "physiological", "cognitive_load", "emotional", "symptoms"],
        "properties": {
            "date": { "type": "string", "format": "date" },
            "physiological": {
                "type": "object",
                "required": ["sleep_hours"],
                "properties": { "sleep_hours": number }
            },
            "cognitive_load": {
                "type": "object",
                "required": ["study_minutes"],
                "properties": { "study_minutes": number }
            },
            "emotional": {
                "type": "object",
                "required": ["stress"],
                "properties": { "stress": number }
            },
            "symptoms": {
                "type": "object",
                "required": ["tic_count"],
                "properties": { "tic_count": number }
            },
            "screen": {
                "type": "object",
                "properties": { "screen_time_hours": number }
            },
            "social": {
                "type": "object",
                "properties": { "social_conflict": { "type": ["boolean", "integer", "string"] } }
            },
            "custom": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["name", "level", "effect"],
                    "properties": {
                        "name": { "type": "string", "minLength": 1 },
                        "level": number,
                        "effect": number
                    }
                }
            },
            "journal": { "type": "string" }
        }
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "myflow.analysis_report",
        "description": "MyFlow personal-baseline analysis report",
        "type": "object",
        "required": [
            "producer", "computed_at_utc", "window_days", "days_analyzed",
            "pacing_state", "recommendation", "evaluation_date",
            "tnl_latest", "tnl_threshold", "tic_latest", "tic_threshold",
            "protective_factors", "best_days", "sleep_correlation",
            "sleep_vulnerability", "per_day_breakdown"
        ],
        "properties": {
            "producer": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "version": { "type": "string" },
                    "instance_id": { "type": "string" }
                }
            },
            "computed_at_utc": { "type": "string", "format": "date-time" },
            "window_days": { "type": "integer" },
            "days_analyzed": { "type": "integer" },
            "pacing_state": {
                "type": "string",
                "enum": ["GREEN_LIGHT", "HIGH_LOAD_WARNING", "ADAPTIVE_PACING_ALERT", "UNUSUAL_SPIKE"]
            },
            "recommendation": { "type": "string" },
            "evaluation_date": { "type": "string", "format": "date" },
            "tnl_latest": { "type": "number" },
            "tnl_threshold": { "type": "number" },
            "tic_latest": { "type": "number" },
            "tic_threshold": { "type": "number" },
            "protective_factors": { "type": "array", "items": { "type": "object" } },
            "best_days": { "type": "array", "items": { "type": "object" } },
            "sleep_correlation": {
                "type": "object",
                "properties": {
                    "r": { "type": "number", "minimum": -1, "maximum": 1 },
                    "optimal_sleep_hours": { "type": "number" }
                }
            },
            "sleep_vulnerability": { "type": "object" },
            "per_day_breakdown": { "type": "array", "items": { "type": "object" } }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum MyflowCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    ValidationFailed(usize),
}

impl From<io::Error> for MyflowCliError {
    fn from(e: io::Error) -> Self {
        MyflowCliError::Io(e)
    }
}

impl From<ComputeError> for MyflowCliError {
    fn from(e: ComputeError) -> Self {
        MyflowCliError::Compute(e)
    }
}

impl From<serde_json::Error> for MyflowCliError {
    fn from(e: serde_json::Error) -> Self {
        MyflowCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<MyflowCliError> for CliError {
    fn from(e: MyflowCliError) -> Self {
        match e {
            MyflowCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            MyflowCliError::Compute(e) => {
                let hint = match &e {
                    ComputeError::MalformedEntry { .. } => "Run 'myflow validate' for details",
                    ComputeError::InsufficientData { .. } => {
                        "Keep logging; personal baselines need a full window of days"
                    }
                    ComputeError::UnknownEvaluationDate(_) => {
                        "Pick a date that appears in the logs, or omit --evaluation-date"
                    }
                    ComputeError::InvalidConfig(_) => "Check the config file and flags",
                    _ => "Check input format",
                };
                CliError {
                    code: e.kind().to_ascii_uppercase(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            MyflowCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            MyflowCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} entries failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
        }
    }
}
