//! Step resolution
//!
//! Turns a query's declared interval into the step it will run with:
//!
//! ```text
//! declared interval ──► min interval ──► policy.calculate ──┐
//!                                        policy.calculate_safe ─► max ─► × factor
//!                                                                   └──► rate interval
//! ```
//!
//! The safe interval keeps a query under `safe_resolution` points no matter
//! what the declared interval asks for.

use crate::interval::{interval_from, parse_interval, IntervalPolicy};
use crate::query::error::QueryResult;
use crate::query::interpolate::Variable;
use crate::query::model::{RawQueryModel, TimeWindow};
use std::time::Duration;

/// Maximum number of points a query may produce
pub const SAFE_RESOLUTION: i64 = 11_000;

/// Minimum interval when neither the query nor the datasource declares one
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(15);

/// Scrape interval assumed by the rate heuristic when none is configured
pub const DEFAULT_SCRAPE_INTERVAL: Duration = Duration::from_secs(15);

/// Tunables for step resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverSettings {
    pub safe_resolution: i64,
    pub default_interval: Duration,
    pub default_scrape_interval: Duration,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            safe_resolution: SAFE_RESOLUTION,
            default_interval: DEFAULT_INTERVAL,
            default_scrape_interval: DEFAULT_SCRAPE_INTERVAL,
        }
    }
}

/// Resolve the step for `model` over `window`.
///
/// `scrape_interval` is the datasource's configured scrape interval text
/// (may be empty).
pub fn resolve_step(
    model: &RawQueryModel,
    scrape_interval: &str,
    window: &TimeWindow,
    policy: &dyn IntervalPolicy,
    settings: &ResolverSettings,
) -> QueryResult<Duration> {
    // Step variables are computed below, never parsed
    let declared = if Variable::is_step_variable(&model.interval) {
        ""
    } else {
        model.interval.as_str()
    };

    let min_interval = interval_from(
        scrape_interval,
        declared,
        model.interval_ms,
        settings.default_interval,
    )?;

    let calculated = policy.calculate(window, min_interval, window.max_data_points);
    let safe = policy.calculate_safe(window, settings.safe_resolution);
    let adjusted = calculated.max(safe);

    tracing::debug!(
        ?min_interval,
        ?calculated,
        ?safe,
        ?adjusted,
        "Calculated query interval"
    );

    // Rate interval is final and ignores the interval factor
    if Variable::RateInterval.matches(&model.interval) {
        return Ok(rate_interval(adjusted, scrape_interval, settings));
    }

    let factor = if model.interval_factor > 0 {
        u32::try_from(model.interval_factor).unwrap_or(u32::MAX)
    } else {
        1
    };
    Ok(adjusted.saturating_mul(factor))
}

/// Window for rate/increase-style functions: one scrape of slack beyond the
/// step, and never less than four scrapes.
///
/// An empty or unparseable scrape interval falls back to the configured default.
pub fn rate_interval(
    interval: Duration,
    scrape_interval: &str,
    settings: &ResolverSettings,
) -> Duration {
    let scrape = if scrape_interval.is_empty() {
        settings.default_scrape_interval
    } else {
        parse_interval(scrape_interval).unwrap_or_else(|e| {
            tracing::warn!(
                scrape_interval,
                error = %e,
                "Invalid scrape interval, using default"
            );
            settings.default_scrape_interval
        })
    };

    interval
        .saturating_add(scrape)
        .max(scrape.saturating_mul(4))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryError;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    /// Policy returning fixed values and recording what it was asked
    struct FixedPolicy {
        calculated: Duration,
        safe: Duration,
        seen_min_interval: Mutex<Option<Duration>>,
        seen_resolution: Mutex<Option<i64>>,
    }

    impl FixedPolicy {
        fn new(calculated: Duration, safe: Duration) -> Self {
            Self {
                calculated,
                safe,
                seen_min_interval: Mutex::new(None),
                seen_resolution: Mutex::new(None),
            }
        }
    }

    impl IntervalPolicy for FixedPolicy {
        fn calculate(&self, _window: &TimeWindow, min_interval: Duration, _max_points: i64) -> Duration {
            *self.seen_min_interval.lock().unwrap() = Some(min_interval);
            self.calculated
        }

        fn calculate_safe(&self, _window: &TimeWindow, target_resolution: i64) -> Duration {
            *self.seen_resolution.lock().unwrap() = Some(target_resolution);
            self.safe
        }
    }

    fn window() -> TimeWindow {
        let from = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        TimeWindow::new(from, from + chrono::Duration::hours(1)).max_data_points(1000)
    }

    fn model(interval: &str, factor: i64) -> RawQueryModel {
        RawQueryModel {
            expr: "up".to_string(),
            interval: interval.to_string(),
            interval_factor: factor,
            ..Default::default()
        }
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_calculated_interval_wins_over_smaller_safe() {
        let policy = FixedPolicy::new(secs(30), secs(10));
        let step = resolve_step(&model("", 0), "15s", &window(), &policy, &ResolverSettings::default()).unwrap();
        assert_eq!(step, secs(30));
    }

    #[test]
    fn test_safe_interval_is_floor() {
        let policy = FixedPolicy::new(secs(5), secs(20));
        let step = resolve_step(&model("", 0), "15s", &window(), &policy, &ResolverSettings::default()).unwrap();
        assert_eq!(step, secs(20));
        assert_eq!(*policy.seen_resolution.lock().unwrap(), Some(SAFE_RESOLUTION));
    }

    #[test]
    fn test_interval_factor_multiplies() {
        let policy = FixedPolicy::new(secs(30), secs(10));
        let step = resolve_step(&model("", 3), "15s", &window(), &policy, &ResolverSettings::default()).unwrap();
        assert_eq!(step, secs(90));

        let step = resolve_step(&model("", -2), "15s", &window(), &policy, &ResolverSettings::default()).unwrap();
        assert_eq!(step, secs(30));
    }

    #[test]
    fn test_rate_interval_ignores_factor() {
        let policy = FixedPolicy::new(secs(30), secs(10));
        for declared in ["$__rate_interval", "${__rate_interval}"] {
            let step = resolve_step(&model(declared, 5), "15s", &window(), &policy, &ResolverSettings::default()).unwrap();
            // max(30s + 15s, 4 * 15s)
            assert_eq!(step, secs(60));
        }
    }

    #[test]
    fn test_step_variable_treated_as_absent() {
        let policy = FixedPolicy::new(secs(30), secs(10));
        for declared in ["$__interval", "${__interval}", "$__interval_ms", "${__interval_ms}"] {
            resolve_step(&model(declared, 0), "20s", &window(), &policy, &ResolverSettings::default()).unwrap();
            // Falls through to the configured scrape interval
            assert_eq!(*policy.seen_min_interval.lock().unwrap(), Some(secs(20)));
        }
    }

    #[test]
    fn test_min_interval_precedence() {
        let policy = FixedPolicy::new(secs(30), secs(10));
        let settings = ResolverSettings::default();

        resolve_step(&model("1m", 0), "20s", &window(), &policy, &settings).unwrap();
        assert_eq!(*policy.seen_min_interval.lock().unwrap(), Some(secs(60)));

        let mut with_ms = model("", 0);
        with_ms.interval_ms = 2500;
        resolve_step(&with_ms, "20s", &window(), &policy, &settings).unwrap();
        assert_eq!(*policy.seen_min_interval.lock().unwrap(), Some(Duration::from_millis(2500)));

        resolve_step(&model("", 0), "", &window(), &policy, &settings).unwrap();
        assert_eq!(*policy.seen_min_interval.lock().unwrap(), Some(DEFAULT_INTERVAL));
    }

    #[test]
    fn test_invalid_declared_interval_is_fatal() {
        let policy = FixedPolicy::new(secs(30), secs(10));
        let result = resolve_step(&model("every so often", 0), "15s", &window(), &policy, &ResolverSettings::default());
        assert!(matches!(result, Err(QueryError::InvalidInterval(_))));
    }

    #[test]
    fn test_custom_safe_resolution() {
        let policy = FixedPolicy::new(secs(30), secs(10));
        let settings = ResolverSettings {
            safe_resolution: 500,
            ..Default::default()
        };
        resolve_step(&model("", 0), "15s", &window(), &policy, &settings).unwrap();
        assert_eq!(*policy.seen_resolution.lock().unwrap(), Some(500));
    }

    #[test]
    fn test_rate_interval_bounds() {
        let settings = ResolverSettings::default();

        // Small step: four scrapes dominate
        assert_eq!(rate_interval(secs(15), "15s", &settings), secs(60));
        // Large step: step plus one scrape dominates
        assert_eq!(rate_interval(secs(120), "15s", &settings), secs(135));
        // Scrape interval written in interval syntax
        assert_eq!(rate_interval(secs(10), ">30s", &settings), secs(120));

        for step in [0, 1, 14, 45, 46, 3600] {
            let result = rate_interval(secs(step), "15s", &settings);
            assert!(result >= secs(60));
            assert!(result >= secs(step) + secs(15));
        }
    }

    #[test]
    fn test_rate_interval_scrape_fallback() {
        let settings = ResolverSettings {
            default_scrape_interval: secs(30),
            ..Default::default()
        };
        assert_eq!(rate_interval(secs(10), "", &settings), secs(120));
        assert_eq!(rate_interval(secs(10), "garbage", &settings), secs(120));
    }
}
