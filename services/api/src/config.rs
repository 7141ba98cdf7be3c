//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use study_planner_core::DEFAULT_HORIZON_DAYS;
use tracing::Level;

/// Upper bound for every day-count setting (one hundred years).
const MAX_CONFIGURED_DAYS: i64 = 36_500;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub database_max_connections: u32,
    pub log_level: Level,
    pub cors_origin: String,
    /// How many days past the start date a generated schedule may reach.
    pub schedule_horizon_days: i64,
    pub auth_session_days: i64,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address = parse_var::<SocketAddr>("BIND_ADDRESS", "0.0.0.0:3000")?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;
        let database_max_connections = parse_var::<u32>("DATABASE_MAX_CONNECTIONS", "5")?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

        // --- Scheduling and Auth Settings ---
        let schedule_horizon_days = parse_bounded_var(
            "SCHEDULE_HORIZON_DAYS",
            DEFAULT_HORIZON_DAYS,
            MAX_CONFIGURED_DAYS,
        )?;
        let auth_session_days = parse_bounded_var("AUTH_SESSION_DAYS", 30, MAX_CONFIGURED_DAYS)?;

        Ok(Self {
            bind_address,
            database_url,
            database_max_connections,
            log_level,
            cors_origin,
            schedule_horizon_days,
            auth_session_days,
        })
    }
}

/// Reads `name`, falling back to `default`, and parses it.
fn parse_var<T>(name: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}

/// Like [`parse_var`] for a day count that must fall within `1..=max`.
fn parse_bounded_var(name: &str, default: i64, max: i64) -> Result<i64, ConfigError> {
    let value = parse_var::<i64>(name, &default.to_string())?;
    if !(1..=max).contains(&value) {
        return Err(ConfigError::InvalidValue(
            name.to_string(),
            format!("{} is outside the allowed range 1..={}", value, max),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_var_uses_default_when_unset() {
        let value: u32 = parse_var("STUDY_PLANNER_TEST_UNSET_VAR", "7").unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn parse_var_reports_the_variable_name() {
        let err = parse_var::<u32>("STUDY_PLANNER_TEST_UNSET_VAR_2", "not-a-number").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(name, _) if name == "STUDY_PLANNER_TEST_UNSET_VAR_2"));
    }

    #[test]
    fn horizon_days_must_be_within_range() {
        let huge = "STUDY_PLANNER_TEST_HORIZON_HUGE";
        std::env::set_var(huge, "10000000000");
        let err = parse_bounded_var(huge, DEFAULT_HORIZON_DAYS, MAX_CONFIGURED_DAYS).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(name, _) if name == huge));

        let unset = "STUDY_PLANNER_TEST_HORIZON_UNSET";
        let value = parse_bounded_var(unset, DEFAULT_HORIZON_DAYS, MAX_CONFIGURED_DAYS).unwrap();
        assert_eq!(value, DEFAULT_HORIZON_DAYS);
    }

    #[test]
    fn auth_session_days_reject_zero_and_negative() {
        for raw in ["0", "-3"] {
            let name = format!("STUDY_PLANNER_TEST_AUTH_DAYS_{}", raw.replace('-', "NEG"));
            std::env::set_var(&name, raw);
            assert!(parse_bounded_var(&name, 30, MAX_CONFIGURED_DAYS).is_err());
        }
        std::env::set_var("STUDY_PLANNER_TEST_AUTH_DAYS_MAX", MAX_CONFIGURED_DAYS.to_string());
        assert_eq!(
            parse_bounded_var("STUDY_PLANNER_TEST_AUTH_DAYS_MAX", 30, MAX_CONFIGURED_DAYS).unwrap(),
            MAX_CONFIGURED_DAYS
        );
    }
}
