//! Run period parsing and due-time calculation for the daemon

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Shortest period accepted; anything tighter is almost certainly a typo
const MIN_PERIOD_SECONDS: u64 = 60;

/// Longest period accepted (ten years)
const MAX_PERIOD_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;

/// Parse a period like "1d", "12h" or "90m"
///
/// # Errors
///
/// Returns `ConfigError::InvalidPeriod` if the string is not a humantime
/// duration, is shorter than a minute or longer than ten years.
pub fn parse_period(input: &str) -> Result<Duration> {
    let period = humantime::parse_duration(input.trim())
        .map_err(|_| ConfigError::InvalidPeriod(input.to_string()))?;

    if !(MIN_PERIOD_SECONDS..=MAX_PERIOD_SECONDS).contains(&period.as_secs()) {
        return Err(ConfigError::InvalidPeriod(input.to_string()).into());
    }

    Ok(period)
}

/// How long to wait before the next run
///
/// `last_run` is the Unix timestamp of the most recently stored fact. With no
/// previous run, or one older than `period`, the routine is due immediately.
pub fn due_in(last_run: Option<i64>, period: Duration, now: DateTime<Utc>) -> Duration {
    let Some(last_run) = last_run else {
        return Duration::ZERO;
    };

    let period = i64::try_from(period.as_secs()).unwrap_or(i64::MAX);
    let next = last_run.saturating_add(period);
    let remaining = next.saturating_sub(now.timestamp());
    if remaining <= 0 {
        Duration::ZERO
    } else {
        Duration::from_secs(remaining as u64)
    }
}
