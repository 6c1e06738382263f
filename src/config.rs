//! Client configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_REPORT_POLL_ATTEMPTS: u32 = 5;
pub const DEFAULT_REPORT_POLL_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_REPORT_POLL_MAX_INTERVAL_MS: u64 = 8000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request: Duration,
    pub connect: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

/// How often `get_report` is re-polled while the backend reports `ready: false`.
///
/// `attempts == 1` is the single-shot behavior: one poll, then idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportPolling {
    pub attempts: u32,
    pub initial_interval: Duration,
    pub max_interval: Duration,
}

impl ReportPolling {
    /// Poll exactly once.
    #[must_use]
    pub fn single_shot() -> Self {
        Self { attempts: 1, initial_interval: Duration::ZERO, max_interval: Duration::ZERO }
    }

    /// Delay to wait before the zero-based `attempt`.
    ///
    /// The first attempt is immediate; later ones double from
    /// `initial_interval` and are capped at `max_interval`.
    #[must_use]
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 1_u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
        self.initial_interval
            .checked_mul(factor)
            .map_or(self.max_interval, |delay| delay.min(self.max_interval))
    }
}

impl Default for ReportPolling {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_REPORT_POLL_ATTEMPTS,
            initial_interval: Duration::from_millis(DEFAULT_REPORT_POLL_INTERVAL_MS),
            max_interval: Duration::from_millis(DEFAULT_REPORT_POLL_MAX_INTERVAL_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeouts: Timeouts,
    pub polling: ReportPolling,
    pub download_dir: PathBuf,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `RISKCHAT_API_BASE_URL`: default `http://localhost:5000/api`
    /// - `RISKCHAT_REQUEST_TIMEOUT_SECS`: default 30, clamped to at least 1
    /// - `RISKCHAT_CONNECT_TIMEOUT_SECS`: default 10, clamped to at least 1
    /// - `RISKCHAT_REPORT_POLL_ATTEMPTS`: default 5, clamped to at least 1
    /// - `RISKCHAT_REPORT_POLL_INTERVAL_MS`: default 1000
    /// - `RISKCHAT_REPORT_POLL_MAX_INTERVAL_MS`: default 8000
    /// - `RISKCHAT_DOWNLOAD_DIR`: default `.`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if the base URL is empty or
    /// not an `http(s)` URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ClientConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = normalize_base_url(
            lookup("RISKCHAT_API_BASE_URL")
                .as_deref()
                .unwrap_or(DEFAULT_API_BASE_URL),
        )?;

        let timeouts = Timeouts {
            request: Duration::from_secs(
                parse_or(&lookup, "RISKCHAT_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS).max(1),
            ),
            connect: Duration::from_secs(
                parse_or(&lookup, "RISKCHAT_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS).max(1),
            ),
        };

        let polling = ReportPolling {
            attempts: parse_or(&lookup, "RISKCHAT_REPORT_POLL_ATTEMPTS", DEFAULT_REPORT_POLL_ATTEMPTS).max(1),
            initial_interval: Duration::from_millis(parse_or(
                &lookup,
                "RISKCHAT_REPORT_POLL_INTERVAL_MS",
                DEFAULT_REPORT_POLL_INTERVAL_MS,
            )),
            max_interval: Duration::from_millis(parse_or(
                &lookup,
                "RISKCHAT_REPORT_POLL_MAX_INTERVAL_MS",
                DEFAULT_REPORT_POLL_MAX_INTERVAL_MS,
            )),
        };

        let download_dir = lookup("RISKCHAT_DOWNLOAD_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map_or_else(|| PathBuf::from("."), PathBuf::from);

        Ok(Self { base_url, timeouts, polling, download_dir })
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_owned(),
            timeouts: Timeouts::default(),
            polling: ReportPolling::default(),
            download_dir: PathBuf::from("."),
        }
    }
}

/// Trim trailing slashes and reject anything that is not `http(s)`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidBaseUrl`] for empty or non-HTTP input.
pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let has_host = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .is_some_and(|rest| !rest.is_empty());
    if !has_host {
        return Err(ConfigError::InvalidBaseUrl(raw.to_owned()));
    }
    Ok(trimmed.to_owned())
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
