use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context};
use outagewatch_core::config::{
    LifecycleConfig, DEFAULT_ARCHIVE_GRACE_MINUTES, DEFAULT_ORANGE_AFTER_MINUTES,
    DEFAULT_RED_AFTER_MINUTES, DEFAULT_YELLOW_AFTER_MINUTES,
};

/// Default pause between two sweeps.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => bail!("LOG_FORMAT must be `pretty` or `json`, got `{other}`"),
        }
    }
}

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub sweep_interval: Duration,
    pub lifecycle: LifecycleConfig,
    pub log_format: LogFormat,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default    |
    /// |---------------------------|------------|
    /// | `DATABASE_URL`            | (required) |
    /// | `DB_MAX_CONNECTIONS`      | `5`        |
    /// | `SWEEP_INTERVAL_SECS`     | `60`       |
    /// | `ARCHIVE_GRACE_MINUTES`   | `120`      |
    /// | `SEVERITY_YELLOW_MINUTES` | `60`       |
    /// | `SEVERITY_ORANGE_MINUTES` | `120`      |
    /// | `SEVERITY_RED_MINUTES`    | `240`      |
    /// | `LOG_FORMAT`              | `pretty`   |
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .context("DATABASE_URL must be set")?;

        let db_max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?;
        if db_max_connections == 0 {
            bail!("DB_MAX_CONNECTIONS must be at least 1");
        }

        let sweep_interval_secs = parse_or(&lookup, "SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS)?;
        if sweep_interval_secs == 0 {
            bail!("SWEEP_INTERVAL_SECS must be at least 1");
        }

        let lifecycle = LifecycleConfig::from_minutes(
            parse_or(&lookup, "SEVERITY_YELLOW_MINUTES", DEFAULT_YELLOW_AFTER_MINUTES)?,
            parse_or(&lookup, "SEVERITY_ORANGE_MINUTES", DEFAULT_ORANGE_AFTER_MINUTES)?,
            parse_or(&lookup, "SEVERITY_RED_MINUTES", DEFAULT_RED_AFTER_MINUTES)?,
            parse_or(&lookup, "ARCHIVE_GRACE_MINUTES", DEFAULT_ARCHIVE_GRACE_MINUTES)?,
        )
        .context("invalid lifecycle thresholds")?;

        let log_format = match lookup("LOG_FORMAT") {
            Some(v) => v.parse()?,
            None => LogFormat::Pretty,
        };

        Ok(Self {
            database_url,
            db_max_connections,
            sweep_interval: Duration::from_secs(sweep_interval_secs),
            lifecycle,
            log_format,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a number, got `{raw}`")),
        None => Ok(default),
    }
}
