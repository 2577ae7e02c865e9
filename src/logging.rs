/// Logging setup for the amman-config binary
///
/// Structured logging through the tracing framework, written to stderr so the
/// exported configuration on stdout stays machine-readable, with optional
/// daily-rotated log files.
use crate::error::Result;
use std::io;
use std::path::PathBuf;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt,
    layer::{Layered, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

type BoxedLayer = Box<dyn Layer<Layered<EnvFilter, Registry>> + Send + Sync>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable console output
    Console,
    /// JSON structured logs
    Json,
}

/// Log configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level (debug, info, warn, error)
    pub level: Level,
    /// Output format
    pub format: LogFormat,
    /// Log file directory, file logging is off when unset
    pub log_dir: Option<PathBuf>,
    /// Log file prefix
    pub log_file_prefix: String,
    /// Enable stderr logging
    pub enable_console: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Console,
            log_dir: None,
            log_file_prefix: "amman-config".to_string(),
            enable_console: true,
        }
    }
}

impl LogConfig {
    /// Create a new log configuration with custom settings
    pub fn new(level: Level, format: LogFormat) -> Self {
        Self {
            level,
            format,
            ..Default::default()
        }
    }

    /// Enable file logging with rotation
    pub fn with_file_logging(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(log_dir.into());
        self
    }

    /// Set log file prefix
    pub fn with_file_prefix(mut self, prefix: &str) -> Self {
        self.log_file_prefix = prefix.to_string();
        self
    }

    /// Disable stderr logging
    pub fn without_console(mut self) -> Self {
        self.enable_console = false;
        self
    }
}

fn format_layer<S, W>(format: LogFormat, writer: W, ansi: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    W: for<'w> fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Console => fmt::layer().with_writer(writer).with_ansi(ansi).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
    }
}

/// Initialize logging system with the given configuration
///
/// Returns a WorkerGuard when file logging is enabled; it must be kept alive for
/// the duration of the program, dropping it stops log writing to files.
pub fn init_logging(config: LogConfig) -> Result<Option<WorkerGuard>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guard = None;

    if let Some(log_dir) = &config.log_dir {
        std::fs::create_dir_all(log_dir)?;

        let file_appender = tracing_appender::rolling::daily(log_dir, &config.log_file_prefix);
        let (non_blocking, worker_guard) = tracing_appender::non_blocking(file_appender);

        layers.push(format_layer(config.format, non_blocking, false));
        guard = Some(worker_guard);
    }

    if config.enable_console {
        layers.push(format_layer(config.format, io::stderr, true));
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .init();

    Ok(guard)
}
