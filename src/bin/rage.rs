//! Rage CLI - command-line interface for the rage tracker engine
//!
//! Commands:
//! - replay: Replay a recorded frame stream and print the session summary
//! - validate: Validate a recorded frame stream
//! - config: Show or check engine configuration
//! - doctor: Diagnose engine version and configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

use rage_tracker::replay::{FrameReplay, ReplayFormat};
use rage_tracker::{
    replay_to_summary, ConfigProfile, EngineConfig, SummaryEncoder, TrackerError, PRODUCER_NAME,
    TRACKER_VERSION,
};

/// Rage - emotion classification and temporal smoothing engine
#[derive(Parser)]
#[command(name = "rage")]
#[command(version = TRACKER_VERSION)]
#[command(about = "Replay and inspect emotion tracking sessions", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded frame stream and print the session summary
    Replay {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Game label stamped on the summary
        #[arg(short, long)]
        game: String,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Engine config file (JSON)
        #[arg(long, conflicts_with = "profile")]
        config: Option<PathBuf>,

        /// Named config profile (balanced, reactive, conservative)
        #[arg(long)]
        profile: Option<ConfigProfile>,

        /// Wrap the summary in a report with producer metadata
        #[arg(long)]
        report: bool,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Validate a recorded frame stream
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or check engine configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Diagnose engine version and configuration
    Doctor {
        /// Check a config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective config as JSON
    Show {
        /// Named config profile (balanced, reactive, conservative)
        #[arg(long, conflicts_with = "config")]
        profile: Option<ConfigProfile>,

        /// Engine config file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate a config file
    Check {
        /// Config file path
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one frame per line)
    Ndjson,
    /// JSON array of frames
    Json,
}

impl From<InputFormat> for ReplayFormat {
    fn from(format: InputFormat) -> Self {
        match format {
            InputFormat::Ndjson => ReplayFormat::Ndjson,
            InputFormat::Json => ReplayFormat::Json,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Compact JSON on one line
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr so stdout stays machine-readable
fn init_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();
}

fn run(cli: Cli) -> Result<(), RageCliError> {
    match cli.command {
        Commands::Replay {
            input,
            game,
            input_format,
            config,
            profile,
            report,
            output_format,
        } => cmd_replay(
            &input,
            &game,
            input_format,
            config.as_deref(),
            profile,
            report,
            output_format,
        ),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Config { action } => match action {
            ConfigAction::Show { profile, config } => cmd_config_show(profile, config.as_deref()),
            ConfigAction::Check { file } => cmd_config_check(&file),
        },

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

fn cmd_replay(
    input: &Path,
    game: &str,
    input_format: InputFormat,
    config: Option<&Path>,
    profile: Option<ConfigProfile>,
    report: bool,
    output_format: OutputFormat,
) -> Result<(), RageCliError> {
    let engine_config = resolve_config(profile, config)?;
    let input_data = read_input(input)?;
    let records = FrameReplay::parse(&input_data, input_format.into())?;

    if records.is_empty() {
        return Err(RageCliError::NoFrames);
    }
    debug!(frames = records.len(), game, "replaying recorded session");

    let summary = replay_to_summary(game, &records, engine_config)?;

    let output = if report {
        let report = SummaryEncoder::new().encode(&summary);
        format_output(&report, output_format)?
    } else {
        format_output(&summary, output_format)?
    };
    println!("{}", output);

    Ok(())
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), RageCliError> {
    let input_data = read_input(input)?;
    let records = FrameReplay::parse(&input_data, input_format.into())?;
    let issues = FrameReplay::validate_all(&records);

    let report = ValidationReport {
        total_frames: records.len(),
        valid_frames: records.len() - issues.len(),
        invalid_frames: issues.len(),
        faces_detected: records.iter().filter(|r| r.face.is_some()).count(),
        errors: issues
            .iter()
            .map(|issue| ValidationErrorDetail {
                index: issue.index,
                error: issue.message.clone(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total frames:   {}", report.total_frames);
        println!("Valid frames:   {}", report.valid_frames);
        println!("Invalid frames: {}", report.invalid_frames);
        println!("Faces detected: {}", report.faces_detected);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - Frame {}: {}", err.index, err.error);
            }
        }
    }

    if report.invalid_frames > 0 {
        Err(RageCliError::ValidationFailed(report.invalid_frames))
    } else {
        Ok(())
    }
}

fn cmd_config_show(
    profile: Option<ConfigProfile>,
    config: Option<&Path>,
) -> Result<(), RageCliError> {
    let engine_config = resolve_config(profile, config)?;
    println!("{}", engine_config.to_json()?);
    Ok(())
}

fn cmd_config_check(file: &Path) -> Result<(), RageCliError> {
    let config = EngineConfig::load(file)?;
    println!(
        "{}: ok (policy {:?}, confirmation {} frames, {} frames between counts)",
        file.display(),
        config.policy,
        config.debounce.emotion_confirmation_frames,
        config.debounce.frames_between_counts
    );
    Ok(())
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), RageCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "tracker_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Rage tracker version {}", TRACKER_VERSION),
    });

    checks.push(match EngineConfig::default().validate() {
        Ok(()) => DoctorCheck {
            name: "default_config".to_string(),
            status: CheckStatus::Ok,
            message: "Balanced defaults are valid".to_string(),
        },
        Err(e) => DoctorCheck {
            name: "default_config".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    });

    if let Some(config_path) = config {
        let check = if !config_path.exists() {
            DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "Config file does not exist".to_string(),
            }
        } else {
            match EngineConfig::load(config_path) {
                Ok(loaded) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Ok,
                    message: format!(
                        "Config file valid ({:?} policy, {} frames between counts)",
                        loaded.policy, loaded.debounce.frames_between_counts
                    ),
                },
                Err(e) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: e.to_string(),
                },
            }
        };
        checks.push(check);
    }

    // Replays read from stdin when --input is -
    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (replay from stdin ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: TRACKER_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Rage Doctor Report");
        println!("==================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(RageCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn read_input(input: &Path) -> Result<String, RageCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

/// Config file, else named profile, else Balanced defaults
fn resolve_config(
    profile: Option<ConfigProfile>,
    config: Option<&Path>,
) -> Result<EngineConfig, RageCliError> {
    match (config, profile) {
        (Some(path), _) => Ok(EngineConfig::load(path)?),
        (None, Some(profile)) => Ok(EngineConfig::from_profile(profile)),
        (None, None) => Ok(EngineConfig::default()),
    }
}

fn format_output<T: serde::Serialize>(
    value: &T,
    format: OutputFormat,
) -> Result<String, RageCliError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(value)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
    }
}

#[derive(Debug)]
enum RageCliError {
    Io(io::Error),
    Tracker(TrackerError),
    Json(serde_json::Error),
    NoFrames,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for RageCliError {
    fn from(e: io::Error) -> Self {
        RageCliError::Io(e)
    }
}

impl From<TrackerError> for RageCliError {
    fn from(e: TrackerError) -> Self {
        match e {
            TrackerError::Io(e) => RageCliError::Io(e),
            other => RageCliError::Tracker(other),
        }
    }
}

impl From<serde_json::Error> for RageCliError {
    fn from(e: serde_json::Error) -> Self {
        RageCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<RageCliError> for CliError {
    fn from(e: RageCliError) -> Self {
        match e {
            RageCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            RageCliError::Tracker(e) => {
                let (code, hint) = match &e {
                    TrackerError::InvalidConfig(_) => {
                        ("INVALID_CONFIG", "Run 'rage config show' for a valid starting point")
                    }
                    TrackerError::InvalidFrame { .. } => {
                        ("INVALID_FRAME", "Run 'rage validate' for details")
                    }
                    TrackerError::ParseError(_) | TrackerError::JsonError(_) => (
                        "PARSE_ERROR",
                        "Ensure each line is a frame record: {\"elapsed_sec\": .., \"face\": ..}",
                    ),
                    TrackerError::EncodingError(_) | TrackerError::Io(_) => {
                        ("ENGINE_ERROR", "Re-run with --verbose for details")
                    }
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            RageCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            RageCliError::NoFrames => CliError {
                code: "NO_FRAMES".to_string(),
                message: "No frames found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            RageCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} frames failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            RageCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_frames: usize,
    valid_frames: usize,
    invalid_frames: usize,
    faces_detected: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    error: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
