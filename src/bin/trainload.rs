//! trainload CLI - Command-line interface for the trainload engine
//!
//! Commands:
//! - annotate: Write TSS variants onto an activity list
//! - fitness: Compute the daily CTL/ATL/TSB series
//! - progress: Report weekly/monthly goal progress
//! - sync: Merge activities into a store directory and regenerate the series
//! - classify: Map activity type tags to modalities
//! - doctor: Diagnose configuration and store health

use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use trainload::adapters::ActivitySource;
use trainload::pace::format_pace;
use trainload::pipeline::{parse_date, parse_datetime};
use trainload::store::{ActivityRepository, JsonFileRepository, ACTIVITIES_FILE, METRICS_FILE};
use trainload::types::Activity;
use trainload::{classify, EngineConfig, LoadProcessor, ENGINE_NAME, TRAINLOAD_VERSION};

/// trainload - Deterministic training-load engine
#[derive(Parser)]
#[command(name = "trainload")]
#[command(version = TRAINLOAD_VERSION)]
#[command(about = "Turn activity lists into TSS, TRIMP and CTL/ATL/TSB", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Annotate activities with TSS variants
    Annotate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Payload source
        #[arg(long, default_value = "garmin")]
        source: SourceArg,

        /// Engine configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Compute the daily fitness series
    Fitness {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Payload source
        #[arg(long, default_value = "garmin")]
        source: SourceArg,

        /// Engine configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// First day of the series (YYYY-MM-DD); defaults to the first activity
        #[arg(long, value_parser = parse_date)]
        start: Option<NaiveDate>,

        /// Last day of the series (YYYY-MM-DD); defaults to today
        #[arg(long, value_parser = parse_date)]
        end: Option<NaiveDate>,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,
    },

    /// Report weekly and monthly goal progress
    Progress {
        /// Input file path (use - for stdin); defaults to the store's activities
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Payload source for --input
        #[arg(long, default_value = "canonical")]
        source: SourceArg,

        /// Store directory read when --input is absent
        #[arg(long, default_value = ".")]
        store: PathBuf,

        /// Engine configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Reference time (YYYY-MM-DDTHH:MM:SS); defaults to now
        #[arg(long, value_parser = parse_datetime)]
        now: Option<NaiveDateTime>,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Merge activities into a store and regenerate the fitness series
    Sync {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Payload source
        #[arg(long, default_value = "garmin")]
        source: SourceArg,

        /// Store directory
        #[arg(long, default_value = ".")]
        store: PathBuf,

        /// Engine configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Last day of the regenerated series (YYYY-MM-DD); defaults to today
        #[arg(long, value_parser = parse_date)]
        today: Option<NaiveDate>,
    },

    /// Classify activity type tags
    Classify {
        /// Type tags, e.g. "trail_running" or "VirtualRide"
        #[arg(required = true)]
        tags: Vec<String>,
    },

    /// Diagnose configuration and store health
    Doctor {
        /// Engine configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Store directory
        #[arg(long)]
        store: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    /// Garmin Connect activity list
    Garmin,
    /// Strava athlete activities
    Strava,
    /// Previously persisted trainload activities
    Canonical,
}

impl From<SourceArg> for ActivitySource {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Garmin => ActivitySource::Garmin,
            SourceArg::Strava => ActivitySource::Strava,
            SourceArg::Canonical => ActivitySource::Canonical,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    init_logging();
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

/// Human-readable logs on stderr; stdout carries only command output
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trainload=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<(), TrainloadCliError> {
    match cli.command {
        Commands::Annotate {
            input,
            source,
            config,
            output_format,
        } => cmd_annotate(&input, source, config.as_deref(), output_format),

        Commands::Fitness {
            input,
            source,
            config,
            start,
            end,
            output_format,
        } => cmd_fitness(&input, source, config.as_deref(), start, end, output_format),

        Commands::Progress {
            input,
            source,
            store,
            config,
            now,
            output_format,
        } => cmd_progress(
            input.as_deref(),
            source,
            &store,
            config.as_deref(),
            now,
            output_format,
        ),

        Commands::Sync {
            input,
            source,
            store,
            config,
            today,
        } => cmd_sync(&input, source, &store, config.as_deref(), today),

        Commands::Classify { tags } => cmd_classify(&tags),

        Commands::Doctor {
            config,
            store,
            json,
        } => cmd_doctor(config.as_deref(), store.as_deref(), json),
    }
}

fn cmd_annotate(
    input: &Path,
    source: SourceArg,
    config: Option<&Path>,
    output_format: OutputFormat,
) -> Result<(), TrainloadCliError> {
    let config = load_config(config)?;
    let processor = LoadProcessor::new(config.profile);

    let mut activities = ingest(&processor, input, source)?;
    processor.annotate(&mut activities);

    print!("{}", format_output(&activities, &output_format)?);
    Ok(())
}

fn cmd_fitness(
    input: &Path,
    source: SourceArg,
    config: Option<&Path>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    output_format: OutputFormat,
) -> Result<(), TrainloadCliError> {
    let config = load_config(config)?;
    let processor = LoadProcessor::new(config.profile);

    let mut activities = ingest(&processor, input, source)?;
    processor.annotate(&mut activities);

    let end = end.unwrap_or_else(|| Local::now().date_naive());
    let metrics = match start {
        Some(start) => processor.fitness_series(&activities, start, end),
        None => processor.fitness_series_through(&activities, end),
    };

    print!("{}", format_output(&metrics, &output_format)?);
    Ok(())
}

fn cmd_progress(
    input: Option<&Path>,
    source: SourceArg,
    store: &Path,
    config: Option<&Path>,
    now: Option<NaiveDateTime>,
    output_format: OutputFormat,
) -> Result<(), TrainloadCliError> {
    let config = load_config(config)?;
    let processor = LoadProcessor::new(config.profile.clone());
    let now = now.unwrap_or_else(|| Local::now().naive_local());

    let mut activities = match input {
        Some(input) => ingest(&processor, input, source)?,
        None => JsonFileRepository::new(store).load_activities()?,
    };
    processor.annotate(&mut activities);

    let metrics = processor.fitness_series_through(&activities, now.date());
    let progress = processor.progress(&activities, &metrics, &config.goals, now);

    print!("{}", format_output(std::slice::from_ref(&progress), &output_format)?);
    Ok(())
}

fn cmd_sync(
    input: &Path,
    source: SourceArg,
    store: &Path,
    config: Option<&Path>,
    today: Option<NaiveDate>,
) -> Result<(), TrainloadCliError> {
    let config = load_config(config)?;
    let processor = LoadProcessor::new(config.profile);

    let incoming = ingest(&processor, input, source)?;
    let mut repo = JsonFileRepository::new(store);
    let today = today.unwrap_or_else(|| Local::now().date_naive());

    let summary = processor.sync(&mut repo, incoming, today)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_classify(tags: &[String]) -> Result<(), TrainloadCliError> {
    #[derive(Serialize)]
    struct Classification<'a> {
        tag: &'a str,
        modality: trainload::Modality,
    }

    for tag in tags {
        let line = Classification {
            tag: tag.as_str(),
            modality: classify(tag),
        };
        println!("{}", serde_json::to_string(&line)?);
    }
    Ok(())
}

fn cmd_doctor(config: Option<&Path>, store: Option<&Path>, json: bool) -> Result<(), TrainloadCliError> {
    let mut checks = Vec::new();

    // Configuration
    let profile = match config {
        Some(path) => match EngineConfig::from_file(path) {
            Ok(cfg) => {
                checks.push(DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Ok,
                    message: format!("Configuration loaded from {}", path.display()),
                });
                cfg.profile
            }
            Err(e) => {
                checks.push(DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot load configuration: {}", e),
                });
                EngineConfig::default().profile
            }
        },
        None => {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "No configuration given, using default athlete profile".to_string(),
            });
            EngineConfig::default().profile
        }
    };

    checks.push(DoctorCheck {
        name: "profile".to_string(),
        status: CheckStatus::Ok,
        message: format!(
            "FTP {} W, HR {}/{}/{} bpm (rest/threshold/max)",
            profile.ftp, profile.hr_rest, profile.hr_threshold, profile.hr_max
        ),
    });

    if profile.hr_max <= profile.hr_rest {
        checks.push(DoctorCheck {
            name: "heart_rate".to_string(),
            status: CheckStatus::Warning,
            message: "hr_max is not above hr_rest; heart-rate based scores will be 0".to_string(),
        });
    }

    checks.push(pace_check(
        "pace_threshold",
        &profile.pace_threshold,
        profile.pace_threshold_secs(),
        "/km",
    ));
    checks.push(pace_check(
        "swim_pace_threshold",
        &profile.swim_pace_threshold,
        profile.swim_pace_threshold_secs(),
        "/100m",
    ));

    // Store
    if let Some(dir) = store {
        let repo = JsonFileRepository::new(dir);
        match repo.load_activities() {
            Ok(activities) => checks.push(DoctorCheck {
                name: "store_activities".to_string(),
                status: if dir.join(ACTIVITIES_FILE).exists() {
                    CheckStatus::Ok
                } else {
                    CheckStatus::Warning
                },
                message: format!("{} activities in {}", activities.len(), ACTIVITIES_FILE),
            }),
            Err(e) => checks.push(DoctorCheck {
                name: "store_activities".to_string(),
                status: CheckStatus::Error,
                message: format!("Cannot read {}: {}", ACTIVITIES_FILE, e),
            }),
        }
        match repo.load_metrics() {
            Ok(metrics) => checks.push(DoctorCheck {
                name: "store_metrics".to_string(),
                status: CheckStatus::Ok,
                message: match metrics.last() {
                    Some(last) => format!("{} days, last {} ({:?})", metrics.len(), last.date, last.form()),
                    None => format!("{} is empty or missing", METRICS_FILE),
                },
            }),
            Err(e) => checks.push(DoctorCheck {
                name: "store_metrics".to_string(),
                status: CheckStatus::Error,
                message: format!("Cannot read {}: {}", METRICS_FILE, e),
            }),
        }
    }

    checks.push(DoctorCheck {
        name: "sources".to_string(),
        status: CheckStatus::Ok,
        message: ActivitySource::ALL
            .iter()
            .map(ActivitySource::as_str)
            .collect::<Vec<_>>()
            .join(", "),
    });

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (pass --input <file>)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (--input - ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        engine: ENGINE_NAME.to_string(),
        version: TRAINLOAD_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("trainload Doctor Report");
        println!("=======================");
        println!("Engine:  {}", report.engine);
        println!("Version: {}", report.version);
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
        Err(TrainloadCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn pace_check(name: &str, raw: &str, secs: f64, unit: &str) -> DoctorCheck {
    let parsed = trainload::pace::parse_clock(raw).is_some();
    DoctorCheck {
        name: name.to_string(),
        status: if parsed {
            CheckStatus::Ok
        } else {
            CheckStatus::Warning
        },
        message: if parsed {
            format!("{}{}", format_pace(secs), unit)
        } else {
            format!("'{}' is not a clock value, using {}{}", raw, format_pace(secs), unit)
        },
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, TrainloadCliError> {
    match path {
        Some(path) => Ok(EngineConfig::from_file(path)?),
        None => Ok(EngineConfig::default()),
    }
}

fn read_input(input: &Path) -> Result<String, TrainloadCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn ingest(
    processor: &LoadProcessor,
    input: &Path,
    source: SourceArg,
) -> Result<Vec<Activity>, TrainloadCliError> {
    let raw_json = read_input(input)?;
    let source = ActivitySource::from(source);
    tracing::debug!(%source, input = %input.display(), "reading activities");
    Ok(processor.ingest(source.adapter().as_ref(), &raw_json)?)
}

fn format_output<T: Serialize>(records: &[T], format: &OutputFormat) -> Result<String, TrainloadCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut out = String::new();
            for record in records {
                out.push_str(&serde_json::to_string(record)?);
                out.push('\n');
            }
            Ok(out)
        }
        OutputFormat::Json => Ok(serde_json::to_string(records)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(records)? + "\n"),
    }
}

// Error types

#[derive(Debug)]
enum TrainloadCliError {
    Io(io::Error),
    Compute(trainload::ComputeError),
    Json(serde_json::Error),
    DoctorFailed,
}

impl From<io::Error> for TrainloadCliError {
    fn from(e: io::Error) -> Self {
        TrainloadCliError::Io(e)
    }
}

impl From<trainload::ComputeError> for TrainloadCliError {
    fn from(e: trainload::ComputeError) -> Self {
        TrainloadCliError::Compute(e)
    }
}

impl From<serde_json::Error> for TrainloadCliError {
    fn from(e: serde_json::Error) -> Self {
        TrainloadCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<TrainloadCliError> for CliError {
    fn from(e: TrainloadCliError) -> Self {
        use trainload::ComputeError;

        match e {
            TrainloadCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            TrainloadCliError::Compute(e) => {
                let (code, hint) = match &e {
                    ComputeError::ConfigError(_) => ("CONFIG_ERROR", "Check the configuration JSON"),
                    ComputeError::DateParseError(_) => ("DATE_ERROR", "Use YYYY-MM-DD dates"),
                    ComputeError::UnsupportedSource(_) => {
                        ("UNSUPPORTED_SOURCE", "Use garmin, strava or canonical")
                    }
                    ComputeError::Io(_) => ("IO_ERROR", "Check file paths and permissions"),
                    _ => ("PARSE_ERROR", "Ensure input matches the selected --source"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            TrainloadCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            TrainloadCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(Serialize)]
struct DoctorReport {
    engine: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
