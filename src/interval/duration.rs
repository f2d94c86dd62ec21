//! Duration codec
//!
//! Parses and formats the compact interval strings used throughout query
//! models and datasource settings: `15s`, `1m30s`, `1.5h`, `250ms`.
//!
//! # Units
//!
//! ```text
//! y  = 365d    w  = 7d     d  = 24h    h, m, s
//! ms = 1e-3s   us = µs = 1e-6s          ns = 1e-9s
//! ```
//!
//! Formatting always produces the canonical compound form, from days down to
//! nanoseconds, so `parse_duration(&format_duration(d)) == Ok(d)`.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1},
    combinator::{all_consuming, opt, value},
    multi::many1,
    sequence::preceded,
    IResult,
};
use serde::Serializer;
use std::fmt::Write;
use std::time::Duration;
use thiserror::Error;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;
const NANOS_PER_MIN: u128 = 60 * NANOS_PER_SEC;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MIN;
const NANOS_PER_DAY: u128 = 24 * NANOS_PER_HOUR;
const NANOS_PER_WEEK: u128 = 7 * NANOS_PER_DAY;
const NANOS_PER_YEAR: u128 = 365 * NANOS_PER_DAY;

/// Units emitted by [`format_duration`], largest first
const FORMAT_UNITS: [(&str, u128); 7] = [
    ("d", NANOS_PER_DAY),
    ("h", NANOS_PER_HOUR),
    ("m", NANOS_PER_MIN),
    ("s", NANOS_PER_SEC),
    ("ms", NANOS_PER_MILLI),
    ("us", NANOS_PER_MICRO),
    ("ns", 1),
];

/// Fraction digits beyond this are below nanosecond precision for every unit
const MAX_FRACTION_DIGITS: usize = 18;

/// Errors produced by the duration codec
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DurationError {
    /// Text is not a sequence of `<number><unit>` components
    #[error("Invalid duration format: '{0}'")]
    InvalidFormat(String),

    /// Value does not fit in a duration
    #[error("Duration out of range: '{0}'")]
    Overflow(String),
}

/// One `<number><unit>` component, e.g. `1.5h`
struct Component<'a> {
    whole: &'a str,
    fraction: Option<&'a str>,
    unit_nanos: u128,
}

impl Component<'_> {
    fn nanos(&self) -> Option<u128> {
        let whole: u128 = self.whole.parse().ok()?;
        let mut total = whole.checked_mul(self.unit_nanos)?;

        if let Some(fraction) = self.fraction {
            let digits = &fraction[..fraction.len().min(MAX_FRACTION_DIGITS)];
            let numerator: u128 = digits.parse().ok()?;
            let denominator = 10u128.pow(digits.len() as u32);
            total = total.checked_add(numerator * self.unit_nanos / denominator)?;
        }

        Some(total)
    }
}

/// Parse a duration string such as `15s`, `1h30m` or `0.5m`
pub fn parse_duration(text: &str) -> Result<Duration, DurationError> {
    let trimmed = text.trim();
    if trimmed == "0" {
        return Ok(Duration::ZERO);
    }

    let (_, components) = all_consuming(many1(parse_component))(trimmed)
        .map_err(|_| DurationError::InvalidFormat(text.to_string()))?;

    let mut total: u128 = 0;
    for component in &components {
        total = component
            .nanos()
            .and_then(|nanos| total.checked_add(nanos))
            .ok_or_else(|| DurationError::Overflow(text.to_string()))?;
    }

    nanos_to_duration(total).ok_or_else(|| DurationError::Overflow(text.to_string()))
}

/// Format a duration in canonical compact form (`1m30s`, `250ms`, `0s`)
pub fn format_duration(duration: Duration) -> String {
    if duration.is_zero() {
        return "0s".to_string();
    }

    let mut remaining = duration.as_nanos();
    let mut out = String::new();
    for (suffix, unit) in FORMAT_UNITS {
        let count = remaining / unit;
        if count > 0 {
            let _ = write!(out, "{}{}", count, suffix);
            remaining %= unit;
        }
    }
    out
}

/// Serde helper: serialize a duration as its compact text form
pub fn serialize_compact<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_duration(*duration))
}

fn nanos_to_duration(nanos: u128) -> Option<Duration> {
    let secs = u64::try_from(nanos / NANOS_PER_SEC).ok()?;
    let subsec = (nanos % NANOS_PER_SEC) as u32;
    Some(Duration::new(secs, subsec))
}

/// Parse one `<digits>[.<digits>]<unit>` component
fn parse_component(input: &str) -> IResult<&str, Component<'_>> {
    let (input, whole) = digit1(input)?;
    let (input, fraction) = opt(preceded(char('.'), digit1))(input)?;
    let (input, unit_nanos) = parse_unit(input)?;

    Ok((
        input,
        Component {
            whole,
            fraction,
            unit_nanos,
        },
    ))
}

/// Parse a unit suffix. Two-letter units are tried before their one-letter prefixes.
fn parse_unit(input: &str) -> IResult<&str, u128> {
    alt((
        value(NANOS_PER_MILLI, tag("ms")),
        value(NANOS_PER_MICRO, alt((tag("us"), tag("µs")))),
        value(1u128, tag("ns")),
        value(NANOS_PER_YEAR, tag("y")),
        value(NANOS_PER_WEEK, tag("w")),
        value(NANOS_PER_DAY, tag("d")),
        value(NANOS_PER_HOUR, tag("h")),
        value(NANOS_PER_MIN, tag("m")),
        value(NANOS_PER_SEC, tag("s")),
    ))(input)
}
