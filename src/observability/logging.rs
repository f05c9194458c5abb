//! Logging bootstrap for host applications.
//!
//! The pipeline itself only emits through the `tracing` macros; this module
//! is the optional subscriber setup for applications that do not configure
//! their own.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::errors::{ExecuteError, ExecuteResult};

/// Minimum level to capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Most verbose.
    Trace,
    /// Debug detail, including rate-limit sleeps and span boundaries.
    Debug,
    /// Default.
    Info,
    /// Warnings, including retry notices.
    Warn,
    /// Failures only.
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, colored.
    Pretty,
    /// Structured JSON for production.
    Json,
    /// Single-line compact.
    Compact,
}

/// Subscriber configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level to capture.
    pub level: LogLevel,
    /// Output format.
    pub format: LogFormat,
    /// Include the module target in output.
    pub include_target: bool,
    /// Include file and line number in output.
    pub include_file_line: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
            include_target: true,
            include_file_line: false,
        }
    }
}

impl LoggingConfig {
    /// Default configuration: info level, pretty format.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum level.
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set the output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Include or exclude the module target.
    pub fn with_target(mut self, include: bool) -> Self {
        self.include_target = include;
        self
    }

    /// Include or exclude file/line info.
    pub fn with_file_line(mut self, include: bool) -> Self {
        self.include_file_line = include;
        self
    }

    /// Install the global subscriber. `RUST_LOG` directives take precedence
    /// over the configured level. Fails if a subscriber is already set.
    pub fn init(self) -> ExecuteResult<()> {
        let filter = EnvFilter::from_default_env().add_directive(LevelFilter::from(self.level).into());

        let result = match self.format {
            LogFormat::Pretty => tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_ansi(true)
                        .with_target(self.include_target)
                        .with_file(self.include_file_line)
                        .with_line_number(self.include_file_line),
                )
                .try_init(),
            LogFormat::Json => tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .try_init(),
            LogFormat::Compact => tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact())
                .try_init(),
        };

        result.map_err(|e| ExecuteError::Configuration(format!("logging init failed: {e}")))
    }
}
