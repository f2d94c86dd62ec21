//! Built-in variable interpolation
//!
//! Expressions may reference six built-in variables, each in two spellings:
//!
//! ```text
//! $__interval_ms   ${__interval_ms}   step in milliseconds
//! $__interval      ${__interval}      step as a duration ("30s")
//! $__range_ms      ${__range_ms}      window length in milliseconds
//! $__range_s       ${__range_s}       window length in whole seconds
//! $__range         ${__range}         window length as "<seconds>s"
//! $__rate_interval ${__rate_interval} rate window as a duration
//! ```
//!
//! Substitution is plain text replacement. `$__interval` is a prefix of
//! `$__interval_ms` (and `$__range` of `$__range_ms` / `$__range_s`), so the
//! suffixed names are always replaced first.

use crate::interval::format_duration;
use std::time::Duration;

/// A built-in variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variable {
    IntervalMs,
    Interval,
    RangeMs,
    RangeS,
    Range,
    RateInterval,
}

impl Variable {
    /// All variables in substitution order
    pub const ALL: [Variable; 6] = [
        Variable::IntervalMs,
        Variable::Interval,
        Variable::RangeMs,
        Variable::RangeS,
        Variable::Range,
        Variable::RateInterval,
    ];

    /// Variables that may stand in for a query's declared step
    pub const STEP: [Variable; 3] = [
        Variable::Interval,
        Variable::IntervalMs,
        Variable::RateInterval,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Variable::IntervalMs => "__interval_ms",
            Variable::Interval => "__interval",
            Variable::RangeMs => "__range_ms",
            Variable::RangeS => "__range_s",
            Variable::Range => "__range",
            Variable::RateInterval => "__rate_interval",
        }
    }

    /// True if `text` is exactly this variable in either spelling
    pub fn matches(&self, text: &str) -> bool {
        Spelling::ALL
            .iter()
            .any(|spelling| spelling.render(*self) == text)
    }

    /// True if `text` is a step variable that must be computed rather than parsed
    pub fn is_step_variable(text: &str) -> bool {
        Self::STEP.iter().any(|variable| variable.matches(text))
    }
}

/// How a variable reference is written in an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spelling {
    /// `$__name`
    Plain,
    /// `${__name}`
    Braced,
}

impl Spelling {
    pub const ALL: [Spelling; 2] = [Spelling::Plain, Spelling::Braced];

    pub fn render(&self, variable: Variable) -> String {
        match self {
            Spelling::Plain => format!("${}", variable.name()),
            Spelling::Braced => format!("${{{}}}", variable.name()),
        }
    }
}

/// Substitute every built-in variable in `expr`.
///
/// Values are computed once and shared by both spellings.
pub fn interpolate_variables(
    expr: &str,
    interval: Duration,
    range: chrono::Duration,
    rate_interval: Duration,
) -> String {
    let range_ms = range.num_milliseconds();
    let range_s = (range_ms as f64 / 1000.0).round() as i64;

    let values: [(Variable, String); 6] = [
        (Variable::IntervalMs, interval.as_millis().to_string()),
        (Variable::Interval, format_duration(interval)),
        (Variable::RangeMs, range_ms.to_string()),
        (Variable::RangeS, range_s.to_string()),
        (Variable::Range, format!("{}s", range_s)),
        (Variable::RateInterval, format_duration(rate_interval)),
    ];

    let mut out = expr.to_string();
    for spelling in Spelling::ALL {
        for (variable, value) in &values {
            let placeholder = spelling.render(*variable);
            if out.contains(&placeholder) {
                tracing::trace!(%placeholder, %value, "Substituting variable");
                out = out.replace(&placeholder, value);
            }
        }
    }
    out
}
