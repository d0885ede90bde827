//! Focus CLI - Command-line interface for Aura Focus
//!
//! Commands:
//! - run: Drive the activity sampling loop from input events on stdin
//! - score-face: Replay face observations through the head-pose scorer
//! - score-activity: Score one activity window from input events
//! - doctor: Diagnose configuration and environment

use std::fs;
use std::io::{self, BufRead, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;

use clap::{Parser, Subcommand};
use crossbeam_channel::{bounded, unbounded};
use tracing_subscriber::EnvFilter;

use aura_focus::activity::ActivityCounters;
use aura_focus::sampler::ActivitySampler;
use aura_focus::sink::HttpTelemetrySink;
use aura_focus::{Config, FocusError, HeadPoseScorer, InputEvent, PRODUCER_NAME, VERSION};

/// Focus - sample keyboard/mouse and head-pose activity into focus scores
#[derive(Parser)]
#[command(name = "focus")]
#[command(author = "Aura Labs")]
#[command(version = VERSION)]
#[command(about = "Focus telemetry engine", long_about = None)]
struct Cli {
    /// Configuration file (JSON); environment variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive the activity sampling loop from NDJSON input events on stdin,
    /// forwarding window scores to the configured telemetry sink
    Run {
        /// Session user id
        #[arg(long)]
        user_id: String,

        /// Override the activity window length in seconds
        #[arg(long)]
        window_secs: Option<u64>,
    },

    /// Replay face observations (NDJSON, `null` for a no-face frame) through
    /// the stateful head-pose scorer, printing one sample per score
    ScoreFace {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,
    },

    /// Score a single activity window from NDJSON input events
    ScoreActivity {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config, FocusError> {
    match path {
        Some(path) => Config::load(path),
        None => Ok(Config::from_env()),
    }
}

fn run(cli: Cli) -> Result<(), FocusError> {
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Run { user_id, window_secs } => cmd_run(config, &user_id, window_secs),
        Commands::ScoreFace { input } => cmd_score_face(&input),
        Commands::ScoreActivity { input } => cmd_score_activity(&input),
        Commands::Doctor { json } => cmd_doctor(&config, json),
    }
}

fn read_input(path: &PathBuf) -> Result<String, FocusError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn cmd_run(config: Config, user_id: &str, window_secs: Option<u64>) -> Result<(), FocusError> {
    if user_id.trim().is_empty() {
        return Err(FocusError::MissingParameter("user_id".to_string()));
    }

    let mut config = config;
    if let Some(secs) = window_secs {
        config.sampling.activity_window_secs = secs;
    }
    if config.sampling.activity_window_secs == 0 {
        return Err(FocusError::ConfigError(
            "activity window must be at least one second".to_string(),
        ));
    }

    let sink = Arc::new(HttpTelemetrySink::new(&config.sink.base_url));
    let sampler = ActivitySampler::new(user_id, config.sampling.activity_window());

    let (events_tx, events_rx) = unbounded::<InputEvent>();
    let (shutdown_tx, shutdown_rx) = bounded::<()>(0);

    let loop_sink = Arc::clone(&sink);
    let handle = thread::spawn(move || sampler.run(events_rx, shutdown_rx, loop_sink.as_ref()));

    // Feed stdin events into the loop; EOF stops the session.
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let event: InputEvent = serde_json::from_str(trimmed)?;
        if events_tx.send(event).is_err() {
            break;
        }
    }

    drop(events_tx);
    drop(shutdown_tx);
    handle
        .join()
        .map_err(|_| FocusError::ConfigError("activity sampler panicked".to_string()))?;
    Ok(())
}

fn cmd_score_face(input: &PathBuf) -> Result<(), FocusError> {
    let data = read_input(input)?;
    let mut scorer = HeadPoseScorer::new();

    for line in data.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let observation = serde_json::from_str(trimmed)?;
        match scorer.score(observation) {
            Some(sample) => println!("{}", serde_json::to_string(&sample)?),
            None => println!("null"),
        }
    }

    Ok(())
}

fn cmd_score_activity(input: &PathBuf) -> Result<(), FocusError> {
    let data = read_input(input)?;
    let mut counters = ActivityCounters::new();

    for line in data.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let event: InputEvent = serde_json::from_str(trimmed)?;
        counters.record(event);
    }

    println!("{}", serde_json::to_string(&counters.flush())?);
    Ok(())
}

fn cmd_doctor(config: &Config, json: bool) -> Result<(), FocusError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{PRODUCER_NAME} {VERSION}"),
    });

    checks.push(match config.validate() {
        Ok(()) => DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: format!(
                "provider endpoint set, sink {}, face every {}s, activity window {}s",
                config.sink.base_url,
                config.sampling.face_interval_secs,
                config.sampling.activity_window_secs
            ),
        },
        Err(e) => DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    });

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
            message: "stdin is a pipe (streaming mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Focus Doctor Report");
        println!("===================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(FocusError::ConfigError(
            "one or more health checks failed".to_string(),
        ))
    } else {
        Ok(())
    }
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
    Error,
}
