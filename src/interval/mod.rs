//! Interval handling
//!
//! - **duration**: Compact duration codec (`15s`, `1m30s`)
//! - **calculator**: Interval policy trait and the stock calculator
//!
//! This module also picks the minimum interval for a query from the
//! declared interval, the declared millisecond interval and the
//! datasource's configured scrape interval.

mod calculator;
mod duration;

pub use calculator::{
    round_interval, IntervalCalculator, IntervalPolicy, DEFAULT_MAX_DATA_POINTS,
    DEFAULT_MIN_INTERVAL,
};
pub use duration::{format_duration, parse_duration, serialize_compact, DurationError};

use std::time::Duration;

/// Parse an interval as written in query models and datasource settings.
///
/// A single `<` and `>` marker is stripped (`>10s` means "at least 10s") and
/// a bare integer is read as seconds.
pub fn parse_interval(text: &str) -> Result<Duration, DurationError> {
    let normalized = text.trim().replacen('<', "", 1).replacen('>', "", 1);

    if !normalized.is_empty() && normalized.chars().all(|c| c.is_ascii_digit()) {
        return parse_duration(&format!("{}s", normalized));
    }
    parse_duration(&normalized)
}

/// Pick the minimum interval for a query.
///
/// Precedence: declared interval text, then declared milliseconds (when
/// positive), then the configured scrape interval, then `default`.
pub fn interval_from(
    configured: &str,
    declared: &str,
    declared_ms: i64,
    default: Duration,
) -> Result<Duration, DurationError> {
    let mut interval = declared;

    if interval.is_empty() && declared_ms > 0 {
        return Ok(Duration::from_millis(declared_ms as u64));
    }
    if interval.is_empty() {
        interval = configured;
    }
    if interval.is_empty() {
        return Ok(default);
    }

    parse_interval(interval)
}
