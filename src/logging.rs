//! Logging initialization
//!
//! Diagnostics go to stderr through `tracing`; stdout carries generated documents and
//! status lines only. Configuration comes from the environment:
//!
//! | variable | values | default |
//! |----------|--------|---------|
//! | `GROM_LOG_LEVEL` | trace/debug/info/warn/error | `info` |
//! | `GROM_LOG_FORMAT` | compact/pretty/json | `compact` |
//! | `GROM_LOG_TARGET_FILTER` | comma-separated directives | none |
//!
//! `RUST_LOG`, when set, replaces the level.

use anyhow::{Context, Result};
use std::env;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// trace/debug/info/warn/error
    pub log_level: String,
    pub format: LogFormat,
    /// Extra filter directives (comma-separated)
    pub target_filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Compact,
            target_filter: None,
        }
    }
}

impl LogConfig {
    /// Parse configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            log_level: lookup("GROM_LOG_LEVEL").unwrap_or(defaults.log_level),
            format: lookup("GROM_LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or(defaults.format),
            target_filter: lookup("GROM_LOG_TARGET_FILTER").filter(|s| !s.trim().is_empty()),
        }
    }

    fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        let mut filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.level().as_str()));
        if let Some(target_filter) = &self.target_filter {
            for directive in target_filter.split(',').map(str::trim).filter(|d| !d.is_empty()) {
                match directive.parse() {
                    Ok(directive) => filter = filter.add_directive(directive),
                    Err(_) => eprintln!("Warning: Invalid log filter directive: {directive}"),
                }
            }
        }
        filter
    }
}

/// Install the global subscriber. Fails when one is already installed.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let fmt_layer = match config.format {
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")
}
