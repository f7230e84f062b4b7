//! Tracing subscriber setup

use anyhow::Context;
use std::fmt;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Level used when `RUST_LOG` is unset or unparsable
pub const DEFAULT_FILTER: &str = "info";

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, colored when stderr is a terminal
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
    /// Single-line records
    Compact,
}

impl LogFormat {
    pub const VARIANTS: [&'static str; 3] = ["pretty", "json", "compact"];

    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
            Self::Compact => "compact",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            format!(
                "unknown log format '{}', expected one of: {}",
                s,
                Self::VARIANTS.join(", ")
            )
        })
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global tracing subscriber.
///
/// Verbosity follows `RUST_LOG` (e.g. `provisioning=debug,info`). Fails if a
/// subscriber is already installed.
pub fn init_logging(service_name: &str, format: LogFormat) -> anyhow::Result<()> {
    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let installed = match format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter())
            .with(layer.with_target(true).with_file(false))
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter())
            .with(layer.json().with_current_span(false))
            .try_init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(env_filter())
            .with(layer.compact().with_target(false))
            .try_init(),
    };
    installed.context("Failed to install tracing subscriber")?;

    tracing::debug!(service = service_name, format = %format, "Logging initialized");

    Ok(())
}
