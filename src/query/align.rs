//! Step alignment
//!
//! Range queries are cached and compared by their boundaries, so start and
//! end are rounded down to a multiple of the step. The rounding is done in
//! the query's local time (`utc_offset_sec`) so that, for example, daily
//! steps land on local midnight. Arithmetic is integral nanoseconds with
//! floor division, which keeps pre-epoch instants rounding toward the past.

use crate::query::error::{QueryError, QueryResult};
use crate::query::model::unix_nanos;
use chrono::{DateTime, TimeZone, Utc};
use std::time::Duration;

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Round `instant` down to a multiple of `step`, measured in the timezone
/// `utc_offset_sec` east of UTC. The result is always in UTC.
///
/// A zero step fails with [`QueryError::NonPositiveStep`].
pub fn align_time<Tz: TimeZone>(
    instant: &DateTime<Tz>,
    step: Duration,
    utc_offset_sec: i64,
) -> QueryResult<DateTime<Utc>> {
    let step_nanos = step.as_nanos() as i128;
    if step_nanos == 0 {
        return Err(QueryError::NonPositiveStep);
    }

    let offset_nanos = utc_offset_sec as i128 * NANOS_PER_SEC;
    let shifted = unix_nanos(instant) + offset_nanos;
    let aligned = shifted.div_euclid(step_nanos) * step_nanos - offset_nanos;

    from_unix_nanos(aligned)
}

fn from_unix_nanos(nanos: i128) -> QueryResult<DateTime<Utc>> {
    let secs = i64::try_from(nanos.div_euclid(NANOS_PER_SEC))
        .map_err(|_| QueryError::InvalidTimeRange(format!("{}ns is out of range", nanos)))?;
    let subsec = nanos.rem_euclid(NANOS_PER_SEC) as u32;

    DateTime::from_timestamp(secs, subsec)
        .ok_or_else(|| QueryError::InvalidTimeRange(format!("{}ns is out of range", nanos)))
}
