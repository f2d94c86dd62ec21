//! Query model types
//!
//! - `RawQueryModel`: the query JSON as sent by the dashboard
//! - `DataQuery` / `QueryRequest`: a batch of raw queries plus their windows
//! - `TimeWindow`: the dashboard time range and point budget
//! - `ResolvedQuery`: the executable query produced by the parser
//! - `AlignedTimeRange`: a resolved query's window snapped to its step

use crate::interval::serialize_compact;
use crate::query::align::align_time;
use crate::query::error::QueryResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::time::Duration;

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Query JSON as stored in a dashboard panel.
///
/// Unknown fields are ignored. Missing and `null` fields take zero values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawQueryModel {
    /// Query expression, possibly containing `$__interval`-style variables
    #[serde(deserialize_with = "null_default")]
    pub expr: String,
    /// Series naming template, carried through untouched
    #[serde(rename = "legendFormat", deserialize_with = "null_default")]
    pub legend_format: String,
    /// Declared step: a duration, a step variable, or empty
    #[serde(deserialize_with = "null_default")]
    pub interval: String,
    /// Declared step in milliseconds, used when `interval` is empty
    #[serde(rename = "intervalMS", deserialize_with = "null_default")]
    pub interval_ms: i64,
    #[serde(rename = "stepMode", deserialize_with = "null_default")]
    pub step_mode: String,
    #[serde(rename = "range", deserialize_with = "null_default")]
    pub range_query: bool,
    #[serde(rename = "instant", deserialize_with = "null_default")]
    pub instant_query: bool,
    #[serde(rename = "exemplar", deserialize_with = "null_default")]
    pub exemplar_query: bool,
    /// Step multiplier; zero means 1
    #[serde(rename = "intervalFactor", deserialize_with = "null_default")]
    pub interval_factor: i64,
    /// Offset from UTC used when aligning the window to the step
    #[serde(rename = "utcOffsetSec", deserialize_with = "null_default")]
    pub utc_offset_sec: i64,
}

/// Decode `null` as the type's zero value
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl RawQueryModel {
    /// Decode a model from JSON text
    pub fn from_json(text: &str) -> QueryResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Decode a model from an already-parsed JSON value
    pub fn from_value(value: &serde_json::Value) -> QueryResult<Self> {
        Ok(Self::deserialize(value)?)
    }
}

/// Dashboard time range plus the number of points the panel can show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    #[serde(rename = "maxDataPoints", default)]
    pub max_data_points: i64,
}

impl TimeWindow {
    /// Create a window with no point budget (the policy picks its default)
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from,
            to,
            max_data_points: 0,
        }
    }

    /// Builder: set the point budget
    pub fn max_data_points(mut self, points: i64) -> Self {
        self.max_data_points = points;
        self
    }

    /// Length of the window (negative when `to` precedes `from`)
    pub fn duration(&self) -> chrono::Duration {
        self.to - self.from
    }

    /// Length of the window in nanoseconds, without overflow for any valid instants
    pub fn span_nanos(&self) -> i128 {
        unix_nanos(&self.to) - unix_nanos(&self.from)
    }
}

/// One query of a request: the raw model plus its window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataQuery {
    #[serde(rename = "refId", default)]
    pub ref_id: String,
    #[serde(rename = "timeRange")]
    pub window: TimeWindow,
    /// Raw query model, decoded by the parser
    #[serde(default)]
    pub json: serde_json::Value,
}

impl DataQuery {
    pub fn new(ref_id: impl Into<String>, window: TimeWindow, json: serde_json::Value) -> Self {
        Self {
            ref_id: ref_id.into(),
            window,
            json,
        }
    }
}

/// A batch of queries sharing request headers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    pub queries: Vec<DataQuery>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl QueryRequest {
    /// True when the request was issued by the alerting engine
    pub fn from_alert(&self) -> bool {
        self.headers.get("FromAlert").map(|v| v == "true").unwrap_or(false)
    }
}

/// A query ready for execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedQuery {
    /// Expression with built-in variables substituted
    pub expr: String,
    #[serde(serialize_with = "serialize_compact")]
    pub step: Duration,
    pub legend_format: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub ref_id: String,
    pub instant_query: bool,
    pub range_query: bool,
    pub exemplar_query: bool,
    pub utc_offset_sec: i64,
}

impl ResolvedQuery {
    /// Window rounded down to multiples of the step
    pub fn time_range(&self) -> QueryResult<AlignedTimeRange> {
        Ok(AlignedTimeRange {
            step: self.step,
            start: align_time(&self.start, self.step, self.utc_offset_sec)?,
            end: align_time(&self.end, self.step, self.utc_offset_sec)?,
        })
    }
}

/// Start and end snapped to step boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AlignedTimeRange {
    #[serde(serialize_with = "serialize_compact")]
    pub step: Duration,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

pub(crate) fn unix_nanos<Tz: chrono::TimeZone>(instant: &DateTime<Tz>) -> i128 {
    instant.timestamp() as i128 * NANOS_PER_SEC + instant.timestamp_subsec_nanos() as i128
}
