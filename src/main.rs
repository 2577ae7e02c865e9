//! amman-config - Export the local validator configuration
//!
//! Builds the configuration record from defaults or a TOML file, applies
//! environment overrides and CLI program registrations, and prints it for the
//! orchestrator to consume.

use amman_config::logging::{init_logging, LogConfig, LogFormat};
use amman_config::AmmanConfig;
use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{info, Level};

/// Output format of the exported configuration
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Toml,
}

/// Local test validator configuration
#[derive(Parser, Debug)]
#[command(name = "amman-config")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Local test validator configuration provider", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Register a locally built program by name (repeatable)
    #[arg(short, long = "program", value_name = "NAME")]
    programs: Vec<String>,

    /// Directory holding program artifacts registered with --program
    #[arg(long, value_name = "DIR", requires = "programs")]
    deploy_dir: Option<PathBuf>,

    /// Fail if a registered program artifact does not exist
    #[arg(long)]
    check: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: Format,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: Level,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Also write logs to daily-rotated files in this directory
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// File name prefix of the rotated log files
    #[arg(long, value_name = "PREFIX", requires = "log_dir")]
    log_file_prefix: Option<String>,

    /// Do not log to stderr
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Console
    };
    let mut log_config = LogConfig::new(cli.log_level, log_format);
    if let Some(dir) = &cli.log_dir {
        log_config = log_config.with_file_logging(dir);
    }
    if let Some(prefix) = &cli.log_file_prefix {
        log_config = log_config.with_file_prefix(prefix);
    }
    if cli.quiet {
        log_config = log_config.without_console();
    }
    let _guard = init_logging(log_config)?;

    let mut config = AmmanConfig::load(cli.config.as_deref())?;

    if !cli.programs.is_empty() {
        let mut registry = (*config.programs).clone();
        for name in &cli.programs {
            match &cli.deploy_dir {
                Some(dir) => registry.register_in(dir, name),
                None => registry.register(name),
            };
        }
        config = config.with_programs(registry);
        config.validate()?;
    }

    info!(
        ledger_dir = %config.validator.ledger_dir.display(),
        rpc = %config.validator.json_rpc_url,
        programs = config.programs.len(),
        relay = config.relay.enabled,
        "Configuration ready"
    );

    if cli.check {
        let missing = config.programs.missing_artifacts();
        if !missing.is_empty() {
            bail!("Missing program artifacts: {}", missing.join(", "));
        }
    }

    let output = match cli.format {
        Format::Json => config.to_json()?,
        Format::Toml => config.to_toml()?,
    };
    println!("{}", output);

    Ok(())
}
