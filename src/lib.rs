//! # Promstep
//!
//! Resolves Prometheus-style dashboard queries into executable queries:
//! a concrete step, a step-aligned time window and an expression with its
//! built-in `$__interval`-style variables substituted.
//!
//! ## Features
//!
//! - **Pluggable interval policy**: inject any [`IntervalPolicy`]; a stock calculator is included
//! - **Safe resolution floor**: steps never produce more than a configured number of points
//! - **Rate interval**: `$__rate_interval` sized from the step and the scrape interval
//! - **Variable interpolation**: both `$__name` and `${__name}` spellings
//! - **Step alignment**: windows snapped to step boundaries in the query's UTC offset
//!
//! ## Modules
//!
//! - [`interval`]: Duration codec and interval policies
//! - [`query`]: Query model, step resolution, interpolation and alignment
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust
//! use promstep::{DataQuery, QueryResolver, TimeWindow};
//! use chrono::{TimeZone, Utc};
//! use std::time::Duration;
//!
//! let resolver = QueryResolver::new("15s");
//!
//! let from = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
//! let window = TimeWindow::new(from, from + chrono::Duration::hours(1)).max_data_points(1000);
//! let query = DataQuery::new("A", window, serde_json::json!({
//!     "expr": "sum(rate(http_requests_total[$__rate_interval]))",
//!     "interval": "30s",
//! }));
//!
//! let resolved = resolver.resolve(&query, false)?;
//! assert_eq!(resolved.step, Duration::from_secs(30));
//! assert_eq!(resolved.expr, "sum(rate(http_requests_total[1m]))");
//!
//! let range = resolved.time_range()?;
//! assert_eq!(range.start, from);
//! # Ok::<(), promstep::QueryError>(())
//! ```

pub mod config;
pub mod interval;
pub mod query;

// Re-export top-level types for convenience
pub use interval::{
    format_duration, parse_duration, DurationError, IntervalCalculator, IntervalPolicy,
};

pub use query::{
    align_time, parse_query, AlignedTimeRange, DataQuery, QueryError, QueryRequest,
    QueryResolver, QueryResult, QueryResultKind, RawQueryModel, ResolvedQuery, ResolverSettings,
    TimeWindow,
};

pub use config::{Config, ConfigError, LoggingConfig};
