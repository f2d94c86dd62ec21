//! Query Parser
//!
//! Decodes a raw query and resolves it into an executable [`ResolvedQuery`]:
//!
//! ```text
//! JSON → RawQueryModel → step → interpolated expr → query kind flags → ResolvedQuery
//! ```

use crate::interval::IntervalPolicy;
use crate::query::error::QueryResult;
use crate::query::interpolate::{interpolate_variables, Variable};
use crate::query::model::{DataQuery, RawQueryModel, ResolvedQuery};
use crate::query::step::{rate_interval, resolve_step, ResolverSettings};

/// Resolve one query.
///
/// `scrape_interval` is the datasource's configured scrape interval (may be
/// empty). When `from_alert` is set, exemplar queries are disabled.
pub fn parse_query(
    query: &DataQuery,
    scrape_interval: &str,
    policy: &dyn IntervalPolicy,
    settings: &ResolverSettings,
    from_alert: bool,
) -> QueryResult<ResolvedQuery> {
    let model = RawQueryModel::from_value(&query.json)?;

    let step = resolve_step(&model, scrape_interval, &query.window, policy, settings)?;

    // A rate-interval step is already the rate interval
    let rate = if Variable::RateInterval.matches(&model.interval) {
        step
    } else {
        rate_interval(step, scrape_interval, settings)
    };
    let expr = interpolate_variables(&model.expr, step, query.window.duration(), rate);

    // Older dashboards set neither flag and expect a range query
    let range_query = model.range_query || !model.instant_query;

    // Exemplars are never fetched for alerting
    let exemplar_query = model.exemplar_query && !from_alert;

    tracing::debug!(
        ref_id = %query.ref_id,
        %expr,
        ?step,
        range_query,
        instant_query = model.instant_query,
        exemplar_query,
        "Resolved query"
    );

    Ok(ResolvedQuery {
        expr,
        step,
        legend_format: model.legend_format,
        start: query.window.from,
        end: query.window.to,
        ref_id: query.ref_id.clone(),
        instant_query: model.instant_query,
        range_query,
        exemplar_query,
        utc_offset_sec: model.utc_offset_sec,
    })
}
