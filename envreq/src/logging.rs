//! Logging setup for binaries embedding envreq.
//!
//! The library itself only emits `tracing` events. Binaries call
//! [`init_logging`] once at startup:
//!
//! ```ignore
//! let config = LogConfig::from_env("info").with_level("debug");
//! init_logging(&config)?;
//! ```

use crate::keys;
use crate::source::{EnvSource, ProcessEnv};
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;

/// Output format for log events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" | "" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to install tracing subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Level applied to envreq targets when no directive is given.
    pub level: String,
    /// Full filter directive from `ENVREQ_LOG`, overrides `level`.
    pub directive: Option<String>,
    pub format: LogFormat,
}

impl LogConfig {
    /// Read `ENVREQ_LOG` and `ENVREQ_LOG_FORMAT` from the process environment.
    pub fn from_env(default_level: &str) -> Self {
        Self::from_source(&ProcessEnv, default_level)
    }

    /// Read `ENVREQ_LOG` and `ENVREQ_LOG_FORMAT` from `env`.
    ///
    /// An unknown format falls back to pretty output.
    pub fn from_source(env: &dyn EnvSource, default_level: &str) -> Self {
        let directive = env
            .lookup(keys::LOG)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let format = env
            .lookup(keys::LOG_FORMAT)
            .and_then(|v| LogFormat::parse(&v))
            .unwrap_or_default();

        Self {
            level: default_level.to_string(),
            directive,
            format,
        }
    }

    /// Force a level, discarding any `ENVREQ_LOG` directive.
    #[must_use]
    pub fn with_level(mut self, level: &str) -> Self {
        self.level = level.to_string();
        self.directive = None;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// The filter directive that will be installed.
    pub fn filter_directive(&self) -> String {
        match &self.directive {
            Some(directive) => directive.clone(),
            None => format!("envreq={level},envreq_cli={level}", level = self.level),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(self.filter_directive()).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Install a global subscriber writing to stderr.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<(), LoggingError> {
    let registry = tracing_subscriber::registry().with(config.env_filter());

    match config.format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(true),
            )
            .try_init()?,
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true)
                    .compact(),
            )
            .try_init()?,
    }

    Ok(())
}
