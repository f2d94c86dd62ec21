//! Query Resolver
//!
//! Holds everything a datasource needs to resolve queries: its configured
//! scrape interval, the resolver settings and the injected interval policy.

use crate::interval::{IntervalCalculator, IntervalPolicy};
use crate::query::error::QueryResult;
use crate::query::model::{DataQuery, QueryRequest, ResolvedQuery};
use crate::query::parser::parse_query;
use crate::query::step::ResolverSettings;
use std::sync::Arc;

/// Resolves raw queries for one datasource
#[derive(Clone)]
pub struct QueryResolver {
    /// Configured scrape interval text, possibly empty
    scrape_interval: String,
    settings: ResolverSettings,
    policy: Arc<dyn IntervalPolicy>,
}

impl QueryResolver {
    /// Create a resolver using the stock interval calculator
    pub fn new(scrape_interval: impl Into<String>) -> Self {
        Self::with_policy(scrape_interval, Arc::new(IntervalCalculator::new()))
    }

    /// Create a resolver with a custom interval policy
    pub fn with_policy(scrape_interval: impl Into<String>, policy: Arc<dyn IntervalPolicy>) -> Self {
        Self {
            scrape_interval: scrape_interval.into(),
            settings: ResolverSettings::default(),
            policy,
        }
    }

    /// Builder: replace the resolver settings
    pub fn settings(mut self, settings: ResolverSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn scrape_interval(&self) -> &str {
        &self.scrape_interval
    }

    /// Resolve a single query
    pub fn resolve(&self, query: &DataQuery, from_alert: bool) -> QueryResult<ResolvedQuery> {
        parse_query(
            query,
            &self.scrape_interval,
            self.policy.as_ref(),
            &self.settings,
            from_alert,
        )
    }

    /// Resolve every query of a request in order, stopping at the first failure
    pub fn resolve_request(&self, request: &QueryRequest) -> QueryResult<Vec<ResolvedQuery>> {
        let from_alert = request.from_alert();

        let resolved = request
            .queries
            .iter()
            .map(|query| {
                self.resolve(query, from_alert).map_err(|e| {
                    tracing::warn!(ref_id = %query.ref_id, error = %e, "Failed to resolve query");
                    e
                })
            })
            .collect::<QueryResult<Vec<_>>>()?;

        tracing::debug!(count = resolved.len(), from_alert, "Resolved query request");
        Ok(resolved)
    }
}

impl std::fmt::Debug for QueryResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryResolver")
            .field("scrape_interval", &self.scrape_interval)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::model::TimeWindow;
    use crate::query::QueryError;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::time::Duration;

    fn data_query(ref_id: &str, json: serde_json::Value) -> DataQuery {
        let from = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let window = TimeWindow::new(from, from + chrono::Duration::hours(6)).max_data_points(1000);
        DataQuery::new(ref_id, window, json)
    }

    #[test]
    fn test_resolve_with_stock_calculator() {
        let resolver = QueryResolver::new("15s");
        let resolved = resolver
            .resolve(&data_query("A", json!({"expr": "rate(x[$__rate_interval])"})), false)
            .unwrap();

        // 6h / 1000 = 21.6s, rounds to 20s
        assert_eq!(resolved.step, Duration::from_secs(20));
        // max(20s + 15s, 60s)
        assert_eq!(resolved.expr, "rate(x[1m])");
    }

    #[test]
    fn test_resolve_request_in_order() {
        let resolver = QueryResolver::new("15s");
        let request = QueryRequest {
            queries: vec![
                data_query("A", json!({"expr": "up", "exemplar": true})),
                data_query("B", json!({"expr": "down", "exemplar": true})),
            ],
            headers: [("FromAlert".to_string(), "true".to_string())].into_iter().collect(),
        };

        let resolved = resolver.resolve_request(&request).unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].ref_id, "A");
        assert_eq!(resolved[1].ref_id, "B");
        assert!(resolved.iter().all(|q| !q.exemplar_query));
    }

    #[test]
    fn test_resolve_request_stops_at_first_error() {
        let resolver = QueryResolver::new("15s");
        let request = QueryRequest {
            queries: vec![
                data_query("A", json!({"expr": "up"})),
                data_query("B", json!({"expr": "up", "interval": "nope"})),
                data_query("C", json!({"expr": "up"})),
            ],
            headers: Default::default(),
        };

        let result = resolver.resolve_request(&request);
        assert!(matches!(result, Err(QueryError::InvalidInterval(_))));
    }

    #[test]
    fn test_custom_settings() {
        let resolver = QueryResolver::new("").settings(ResolverSettings {
            default_interval: Duration::from_secs(60),
            ..Default::default()
        });
        assert_eq!(resolver.scrape_interval(), "");

        let resolved = resolver
            .resolve(&data_query("A", json!({"expr": "up"})), false)
            .unwrap();
        assert_eq!(resolved.step, Duration::from_secs(60));
    }

    #[test]
    fn test_aligned_time_range() {
        let resolver = QueryResolver::new("15s");
        let mut query = data_query("A", json!({"expr": "up", "interval": "1m"}));
        query.window.from = query.window.from + chrono::Duration::seconds(37);
        query.window.to = query.window.to + chrono::Duration::seconds(59);

        let resolved = resolver.resolve(&query, false).unwrap();
        let range = resolved.time_range().unwrap();

        assert_eq!(range.step, Duration::from_secs(60));
        assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap());
        assert_eq!(range.end, Utc.with_ymd_and_hms(2024, 1, 15, 6, 0, 0).unwrap());
        assert_eq!(resolved.time_range().unwrap(), range);
    }
}
