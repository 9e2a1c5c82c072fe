use crate::orchestration::{RetryPolicy, RunSettings};
use chrono::{NaiveDate, NaiveTime};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_TRANSFER_MEMO: &str = "scheduled accrual transfer";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub worker_concurrency: usize,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub retry_multiplier: f64,
    pub run_timeout_secs: u64,
    /// Daily wall-clock time (UTC) of the scheduled run.
    pub run_at: NaiveTime,
    pub transfer_memo: String,
    /// When set, process this date once and exit instead of serving.
    pub run_date: Option<NaiveDate>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue(key.to_string(), reason.to_string())
}

fn parse_or<T: std::str::FromStr>(
    env_map: &HashMap<String, String>,
    key: &str,
    default: &str,
    reason: &str,
) -> Result<T, ConfigError> {
    env_map
        .get(key)
        .map(|s| s.as_str())
        .unwrap_or(default)
        .trim()
        .parse::<T>()
        .map_err(|_| invalid(key, reason))
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = parse_or::<u16>(&env_map, "PORT", "8080", "must be a valid u16")?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let worker_concurrency = parse_or::<usize>(
            &env_map,
            "ACCRUAL_WORKERS",
            "4",
            "must be a positive integer",
        )?;
        if worker_concurrency == 0 {
            return Err(invalid("ACCRUAL_WORKERS", "must be a positive integer"));
        }

        let max_retries = parse_or::<u32>(
            &env_map,
            "ACCRUAL_MAX_RETRIES",
            "3",
            "must be a valid u32",
        )?;

        let retry_delay_ms = parse_or::<u64>(
            &env_map,
            "ACCRUAL_RETRY_DELAY_MS",
            "60000",
            "must be a valid u64",
        )?;

        let retry_multiplier = parse_or::<f64>(
            &env_map,
            "ACCRUAL_RETRY_MULTIPLIER",
            "1.0",
            "must be a number >= 1.0",
        )?;
        if !retry_multiplier.is_finite() || retry_multiplier < 1.0 {
            return Err(invalid("ACCRUAL_RETRY_MULTIPLIER", "must be a number >= 1.0"));
        }

        let run_timeout_secs = parse_or::<u64>(
            &env_map,
            "ACCRUAL_RUN_TIMEOUT_SECS",
            "600",
            "must be a valid u64",
        )?;

        let run_at_str = env_map
            .get("ACCRUAL_RUN_AT")
            .map(|s| s.as_str())
            .unwrap_or("23:30");
        let run_at = NaiveTime::parse_from_str(run_at_str.trim(), "%H:%M")
            .map_err(|_| invalid("ACCRUAL_RUN_AT", "must be HH:MM"))?;

        let transfer_memo = env_map
            .get("TRANSFER_MEMO")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_TRANSFER_MEMO.to_string());

        let run_date = env_map
            .get("ACCRUAL_RUN_DATE")
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .map_err(|_| invalid("ACCRUAL_RUN_DATE", "must be YYYY-MM-DD"))
            })
            .transpose()?;

        Ok(Config {
            port,
            database_path,
            worker_concurrency,
            max_retries,
            retry_delay_ms,
            retry_multiplier,
            run_timeout_secs,
            run_at,
            transfer_memo,
            run_date,
        })
    }

    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            worker_concurrency: self.worker_concurrency,
            run_timeout: Duration::from_secs(self.run_timeout_secs),
            transfer_memo: self.transfer_memo.clone(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            delay: Duration::from_millis(self.retry_delay_ms),
            multiplier: self.retry_multiplier,
        }
    }
}
