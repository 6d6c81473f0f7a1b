use std::env;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },
}

/// Runtime configuration, environment-provided. Parse failures are
/// startup-fatal; missing variables fall back to the defaults below.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the SQLite database file
    pub db_path: String,
    /// Static bearer token gating every API route
    pub api_token: String,
    /// API listen address and port
    pub bind: String,
    pub port: u16,
    /// Seconds between probe rounds
    pub check_interval_seconds: u64,
    /// Path requested by the HTTP health probe
    pub http_check_path: String,
    /// Echo requests per ICMP probe
    pub icmp_ping_count: u32,
    /// Per-probe timeouts, seconds
    pub icmp_timeout_seconds: u64,
    pub tcp_timeout_seconds: u64,
    pub http_timeout_seconds: u64,
    /// Days of probe history to keep; 0 keeps everything
    pub check_retention_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: "monitor.db".into(),
            api_token: "change_this_to_a_random_token".into(),
            bind: "0.0.0.0".into(),
            port: 5000,
            check_interval_seconds: 60,
            http_check_path: "/health".into(),
            icmp_ping_count: 2,
            icmp_timeout_seconds: 2,
            tcp_timeout_seconds: 3,
            http_timeout_seconds: 5,
            check_retention_days: 0,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let defaults = Self::default();

        let config = Self {
            db_path: lookup("DB_PATH").unwrap_or(defaults.db_path),
            api_token: lookup("API_TOKEN").unwrap_or(defaults.api_token),
            bind: lookup("BIND").unwrap_or(defaults.bind),
            port: parse_var(&lookup, "PORT", defaults.port)?,
            check_interval_seconds: parse_var(
                &lookup,
                "CHECK_INTERVAL_SECONDS",
                defaults.check_interval_seconds,
            )?,
            http_check_path: lookup("HTTP_CHECK_PATH").unwrap_or(defaults.http_check_path),
            icmp_ping_count: parse_var(&lookup, "ICMP_PING_COUNT", defaults.icmp_ping_count)?,
            icmp_timeout_seconds: parse_var(
                &lookup,
                "ICMP_TIMEOUT_SECONDS",
                defaults.icmp_timeout_seconds,
            )?,
            tcp_timeout_seconds: parse_var(
                &lookup,
                "TCP_TIMEOUT_SECONDS",
                defaults.tcp_timeout_seconds,
            )?,
            http_timeout_seconds: parse_var(
                &lookup,
                "HTTP_TIMEOUT_SECONDS",
                defaults.http_timeout_seconds,
            )?,
            check_retention_days: parse_var(
                &lookup,
                "CHECK_RETENTION_DAYS",
                defaults.check_retention_days,
            )?,
        };

        if config.check_interval_seconds == 0 {
            return Err(Error::Zero { name: "CHECK_INTERVAL_SECONDS" });
        }
        if config.icmp_ping_count == 0 {
            return Err(Error::Zero { name: "ICMP_PING_COUNT" });
        }

        Ok(config)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_seconds)
    }

    pub fn icmp_timeout(&self) -> Duration {
        Duration::from_secs(self.icmp_timeout_seconds)
    }

    pub fn tcp_timeout(&self) -> Duration {
        Duration::from_secs(self.tcp_timeout_seconds)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, Error> {
    match lookup(name) {
        Some(value) => value
            .parse()
            .map_err(|_| Error::Invalid { name, value }),
        None => Ok(default),
    }
}
