//! Interval policy
//!
//! The resolver never decides on its own how a time window maps to a step;
//! it asks an [`IntervalPolicy`]. [`IntervalCalculator`] is the stock policy:
//! divide the window by the desired point count and snap the result onto a
//! ladder of human-friendly intervals.

use crate::query::TimeWindow;
use std::time::Duration;

/// Point count used when a query does not ask for one
pub const DEFAULT_MAX_DATA_POINTS: i64 = 1500;

/// Smallest interval the stock calculator will ever return
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Capability that turns a time window into step durations
pub trait IntervalPolicy: Send + Sync {
    /// Interval for `window` rendered with at most `max_points` points, never below `min_interval`
    fn calculate(&self, window: &TimeWindow, min_interval: Duration, max_points: i64) -> Duration;

    /// Smallest interval that keeps `window` under `target_resolution` points
    fn calculate_safe(&self, window: &TimeWindow, target_resolution: i64) -> Duration;
}

/// Default interval policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalCalculator {
    min_interval: Duration,
    default_max_points: i64,
}

impl IntervalCalculator {
    /// Create a calculator with the stock floor and point count
    pub fn new() -> Self {
        Self {
            min_interval: DEFAULT_MIN_INTERVAL,
            default_max_points: DEFAULT_MAX_DATA_POINTS,
        }
    }

    /// Builder: set the calculator's own interval floor
    pub fn min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    /// Builder: set the point count used when a query passes zero
    pub fn default_max_points(mut self, points: i64) -> Self {
        self.default_max_points = points;
        self
    }
}

impl Default for IntervalCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl IntervalPolicy for IntervalCalculator {
    fn calculate(&self, window: &TimeWindow, min_interval: Duration, max_points: i64) -> Duration {
        let resolution = if max_points > 0 {
            max_points
        } else {
            self.default_max_points.max(1)
        };

        let raw = divide_window(window, resolution);
        if raw < min_interval {
            return min_interval;
        }
        round_interval(raw)
    }

    fn calculate_safe(&self, window: &TimeWindow, target_resolution: i64) -> Duration {
        let raw = divide_window(window, target_resolution.max(1));
        if raw > self.min_interval {
            round_interval(raw)
        } else {
            self.min_interval
        }
    }
}

/// Window length divided by `parts`; inverted windows count as empty
fn divide_window(window: &TimeWindow, parts: i64) -> Duration {
    let span = u128::try_from(window.span_nanos()).unwrap_or(0);
    let nanos = span / parts as u128;
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// (upper bound, rounded value) pairs in milliseconds
const ROUNDING_LADDER: [(u64, u64); 30] = [
    (10, 1),
    (15, 10),
    (35, 20),
    (75, 50),
    (150, 100),
    (350, 200),
    (750, 500),
    (1_500, 1_000),
    (3_500, 2_000),
    (7_500, 5_000),
    (12_500, 10_000),
    (17_500, 15_000),
    (25_000, 20_000),
    (45_000, 30_000),
    (90_000, 60_000),
    (210_000, 120_000),
    (450_000, 300_000),
    (750_000, 600_000),
    (1_050_000, 900_000),
    (1_500_000, 1_200_000),
    (2_700_000, 1_800_000),
    (5_400_000, 3_600_000),
    (9_000_000, 7_200_000),
    (16_200_000, 10_800_000),
    (32_400_000, 21_600_000),
    (86_400_000, 43_200_000),
    (172_800_000, 86_400_000),
    (604_800_000, 86_400_000),
    (1_814_400_000, 604_800_000),
    (3_628_800_000, 2_592_000_000),
];

const ROUNDED_MAX_MS: u64 = 31_536_000_000;

/// Snap an interval onto the nearest "nice" step (1s, 2s, 5s, 10s, 15s, ...)
pub fn round_interval(interval: Duration) -> Duration {
    let rounded = ROUNDING_LADDER
        .iter()
        .find(|(bound, _)| interval <= Duration::from_millis(*bound))
        .map(|(_, rounded)| *rounded)
        .unwrap_or(ROUNDED_MAX_MS);
    Duration::from_millis(rounded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn window_of(hours: i64) -> TimeWindow {
        let from = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        TimeWindow::new(from, from + chrono::Duration::hours(hours))
    }

    #[test]
    fn test_round_interval_ladder() {
        assert_eq!(round_interval(Duration::from_millis(5)), Duration::from_millis(1));
        assert_eq!(round_interval(Duration::from_millis(1200)), Duration::from_secs(1));
        assert_eq!(round_interval(Duration::from_secs(3)), Duration::from_secs(2));
        assert_eq!(round_interval(Duration::from_secs(16)), Duration::from_secs(15));
        assert_eq!(round_interval(Duration::from_secs(40)), Duration::from_secs(30));
        assert_eq!(round_interval(Duration::from_secs(80)), Duration::from_secs(60));
        assert_eq!(round_interval(Duration::from_secs(3 * 3600)), Duration::from_secs(3 * 3600));
        assert_eq!(
            round_interval(Duration::from_secs(400 * 86_400)),
            Duration::from_millis(ROUNDED_MAX_MS)
        );
    }

    #[test]
    fn test_calculate_respects_min_interval() {
        let calc = IntervalCalculator::new();
        // 1h / 1500 = 2.4s, below a 15s minimum
        let interval = calc.calculate(&window_of(1), Duration::from_secs(15), 1500);
        assert_eq!(interval, Duration::from_secs(15));
    }

    #[test]
    fn test_calculate_rounds_raw_interval() {
        let calc = IntervalCalculator::new();
        // 24h / 1000 = 86.4s, rounds to 1m
        let interval = calc.calculate(&window_of(24), Duration::from_secs(1), 1000);
        assert_eq!(interval, Duration::from_secs(60));
    }

    #[test]
    fn test_calculate_defaults_max_points() {
        let calc = IntervalCalculator::new().default_max_points(100);
        // 1h / 100 = 36s, rounds to 30s
        let interval = calc.calculate(&window_of(1), Duration::from_millis(1), 0);
        assert_eq!(interval, Duration::from_secs(30));
    }

    #[test]
    fn test_calculate_safe() {
        let calc = IntervalCalculator::new();
        // 30d / 11000 = ~235.6s, rounds to 5m
        let safe = calc.calculate_safe(&window_of(24 * 30), 11_000);
        assert_eq!(safe, Duration::from_secs(300));

        // Tiny window falls back to the calculator floor
        let from = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let tiny = TimeWindow::new(from, from + chrono::Duration::milliseconds(5));
        assert_eq!(calc.calculate_safe(&tiny, 11_000), DEFAULT_MIN_INTERVAL);
    }

    #[test]
    fn test_inverted_window_is_empty() {
        let from = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let inverted = TimeWindow::new(from, from - chrono::Duration::hours(1));
        let calc = IntervalCalculator::new();
        assert_eq!(calc.calculate(&inverted, Duration::from_secs(15), 100), Duration::from_secs(15));
        assert_eq!(calc.calculate_safe(&inverted, 11_000), DEFAULT_MIN_INTERVAL);
    }
}
