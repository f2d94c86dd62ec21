//! Query resolution
//!
//! Turns a dashboard query into an executable one:
//!
//! - **model**: Raw query JSON, time windows and resolved queries
//! - **step**: Step resolution and the rate-interval heuristic
//! - **interpolate**: Built-in `$__interval`-style variable substitution
//! - **align**: Snapping a window to step boundaries
//! - **parser**: Orchestrates the above for one query
//! - **resolver**: Per-datasource resolver over query batches
//! - **result**: Result kind classification from frame metadata
//!
//! # Pipeline
//!
//! ```text
//! DataQuery → decode → resolve step → interpolate expr → ResolvedQuery
//!                                                          └─ time_range() → AlignedTimeRange
//! ```
//!
//! # Example
//!
//! ```rust
//! use promstep::query::{DataQuery, QueryResolver, TimeWindow};
//! use chrono::{TimeZone, Utc};
//!
//! let from = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
//! let window = TimeWindow::new(from, from + chrono::Duration::hours(6)).max_data_points(1000);
//! let query = DataQuery::new(
//!     "A",
//!     window,
//!     serde_json::json!({"expr": "rate(http_requests_total[$__rate_interval])"}),
//! );
//!
//! let resolved = QueryResolver::new("15s").resolve(&query, false).unwrap();
//! assert_eq!(resolved.expr, "rate(http_requests_total[1m])");
//! ```

mod align;
mod error;
mod interpolate;
mod model;
mod parser;
mod resolver;
mod result;
mod step;

pub use align::align_time;
pub use error::{QueryError, QueryResult};
pub use interpolate::{interpolate_variables, Spelling, Variable};
pub use model::{
    AlignedTimeRange, DataQuery, QueryRequest, RawQueryModel, ResolvedQuery, TimeWindow,
};
pub use parser::parse_query;
pub use resolver::QueryResolver;
pub use result::{FrameMeta, QueryResultKind, RESULT_TYPE_KEY};
pub use step::{
    rate_interval, resolve_step, ResolverSettings, DEFAULT_INTERVAL, DEFAULT_SCRAPE_INTERVAL,
    SAFE_RESOLUTION,
};
