//! # Split CLI
//!
//! Splits one receipt from a JSON request file.
//!
//! ## Usage
//! ```bash
//! # Split with config from the platform config dir (if present)
//! cargo run -p tabsplit-split --bin split -- --request ./dinner.json
//!
//! # Use an explicit config file
//! cargo run -p tabsplit-split --bin split -- --request ./dinner.json --config ./split.toml
//!
//! # Verbose logging
//! RUST_LOG=debug cargo run -p tabsplit-split --bin split -- --request ./dinner.json
//! ```
//!
//! The outcome is printed to stdout as pretty JSON. Logs go to stderr so
//! the output can be piped. Errors exit with a non-zero status:
//! 2 for bad arguments, 3 when the bill owner has to act, 1 otherwise.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tabsplit_split::{SplitConfig, SplitRequest, SplitResult, SplitSession};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
Tabsplit receipt splitter

Usage: split --request <PATH> [OPTIONS]

Options:
  -r, --request <PATH>   Split request JSON file
  -c, --config <PATH>    Config file (default: platform config dir split.toml)
  -h, --help             Show this help message";

/// Parsed command-line arguments.
struct Args {
    request: PathBuf,
    config: Option<PathBuf>,
}

/// Initializes logging to stderr.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show per-item split details
/// - Default: INFO level
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Returns `Ok(None)` when help was requested.
fn parse_args(args: &[String]) -> Result<Option<Args>, String> {
    let mut request = None;
    let mut config = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--request" | "-r" => {
                let value = args.get(i + 1).ok_or("--request needs a path")?;
                request = Some(PathBuf::from(value));
                i += 1;
            }
            "--config" | "-c" => {
                let value = args.get(i + 1).ok_or("--config needs a path")?;
                config = Some(PathBuf::from(value));
                i += 1;
            }
            "--help" | "-h" => return Ok(None),
            other => return Err(format!("unknown argument: {}", other)),
        }
        i += 1;
    }

    let request = request.ok_or("--request is required")?;
    Ok(Some(Args { request, config }))
}

fn run(args: Args) -> SplitResult<String> {
    let config = SplitConfig::load(args.config)?;
    info!(tolerance = %config.tolerance(), "Configuration loaded");

    let contents = std::fs::read_to_string(&args.request)?;
    let request: SplitRequest = serde_json::from_str(&contents)?;

    let outcome = SplitSession::new(config).split(&request)?;
    Ok(serde_json::to_string_pretty(&outcome)?)
}

fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let args = match parse_args(&args) {
        Ok(Some(args)) => args,
        Ok(None) => {
            println!("{}", USAGE);
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("{}\n\n{}", message, USAGE);
            return ExitCode::from(2);
        }
    };

    match run(args) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Split failed");
            eprintln!("error: {}", e);
            if e.is_user_actionable() {
                ExitCode::from(3)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
