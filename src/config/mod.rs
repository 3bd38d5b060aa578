//! Engine options and process configuration.
//!
//! [`Options`] is what the engine is built with. [`Config`] is what the demo
//! binary loads once at startup from the environment.

use std::env::VarError;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

/// Environment variable holding the `race_all` timeout in milliseconds.
pub const TIMEOUT_VAR: &str = "PROMISE_TIMEOUT_MS";

/// Engine options. Read-only once the engine is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Options {
    /// Per-workload deadline for `race_all`. Zero disables it.
    #[serde(default, rename = "timeout_ms", deserialize_with = "millis")]
    pub timeout: Duration,
}

/// Top-level TOML wrapper.
#[derive(Debug, Deserialize)]
struct OptionsFile {
    #[serde(default)]
    promise: Options,
}

impl Options {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Read [`TIMEOUT_VAR`]. Unset means no timeout.
    pub fn from_env() -> Result<Self> {
        match std::env::var(TIMEOUT_VAR) {
            Ok(raw) => parse_millis(&raw).map(Self::with_timeout),
            Err(VarError::NotPresent) => Ok(Self::default()),
            Err(e @ VarError::NotUnicode(_)) => {
                Err(Error::Config(format!("{TIMEOUT_VAR}: {e}")))
            }
        }
    }

    /// Parse a `[promise]` table, e.g. `timeout_ms = 2000`.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: OptionsFile =
            toml::from_str(content).map_err(|e| Error::Config(format!("bad options: {e}")))?;
        Ok(file.promise)
    }

    /// Load options from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read options file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }
}

fn millis<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_millis)
}

fn parse_millis(raw: &str) -> Result<Duration> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| Error::Config(format!("{TIMEOUT_VAR}={raw:?} is not a millisecond count: {e}")))
}

/// Process configuration for the `promise` binary.
#[derive(Debug)]
pub struct Config {
    pub options: Options,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            options: Options::from_env()?,
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}
