//! Result ceiling enforcement
//!
//! Every count reported to a client and every window materialized from the
//! backend goes through [`BoundedQuery`], so nothing past the configured
//! ceiling is ever visible.

use crate::metrics::SEARCH_RESULTS_CLAMPED_TOTAL;
use crate::search::backend::{FacetCounts, Record, SearchBackend};
use crate::search::error::SearchResult;
use crate::search::query::Query;

/// A `[start, end)` slice of a result set with `start <= end <= limit`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultWindow {
    pub start: usize,
    pub end: usize,
}

impl ResultWindow {
    /// Resolve optional bounds against a ceiling. Missing bounds mean the full
    /// bounded result set; bounds past the ceiling are cut down to it.
    pub fn clamped(start: Option<usize>, end: Option<usize>, limit: usize) -> Self {
        let start = start.unwrap_or(0).min(limit);
        let end = end.unwrap_or(limit).min(limit);
        if start >= end {
            Self { start, end: start }
        } else {
            Self { start, end }
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A query bound to a backend, capped at the query's ceiling
pub struct BoundedQuery<'a> {
    backend: &'a dyn SearchBackend,
    query: &'a Query,
    view: &'a str,
}

impl<'a> BoundedQuery<'a> {
    pub fn new(backend: &'a dyn SearchBackend, query: &'a Query, view: &'a str) -> Self {
        Self {
            backend,
            query,
            view,
        }
    }

    pub fn limit(&self) -> usize {
        self.query.ceiling
    }

    /// Number of results, never more than the ceiling
    pub async fn count(&self) -> SearchResult<usize> {
        let total = self.backend.count(self.query).await?;
        if total > self.limit() {
            self.clamped("count", total);
        }
        Ok(total.min(self.limit()))
    }

    /// Same value as [`BoundedQuery::count`]
    pub async fn len(&self) -> SearchResult<usize> {
        self.count().await
    }

    /// Materialize the records inside `[start, end)` after clamping it
    pub async fn fetch_window(
        &self,
        start: Option<usize>,
        end: Option<usize>,
    ) -> SearchResult<Vec<Record>> {
        let window = ResultWindow::clamped(start, end, self.limit());
        let requested_past_limit = start.map_or(false, |s| s > self.limit())
            || end.map_or(false, |e| e > self.limit());
        if requested_past_limit {
            self.clamped("window", end.or(start).unwrap_or_default());
        }

        if window.is_empty() {
            return Ok(Vec::new());
        }

        let mut records = self.backend.fetch(self.query, window.start, window.len()).await?;
        records.truncate(window.len());
        Ok(records)
    }

    /// Facet counts for the wrapped query
    pub async fn facet_counts(&self) -> SearchResult<FacetCounts> {
        self.backend.facet_counts(self.query).await
    }

    fn clamped(&self, what: &str, requested: usize) {
        tracing::debug!(
            view = self.view,
            what = what,
            requested = requested,
            limit = self.limit(),
            "Clamped to result ceiling"
        );
        SEARCH_RESULTS_CLAMPED_TOTAL
            .with_label_values(&[self.view])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelKind;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use parking_lot::Mutex;

    /// Backend with `total` synthetic hits that records every fetch
    struct StubBackend {
        total: usize,
        fetches: Mutex<Vec<(usize, usize)>>,
    }

    impl StubBackend {
        fn new(total: usize) -> Self {
            Self {
                total,
                fetches: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SearchBackend for StubBackend {
        async fn count(&self, _query: &Query) -> SearchResult<usize> {
            Ok(self.total)
        }

        async fn fetch(&self, _query: &Query, offset: usize, limit: usize) -> SearchResult<Vec<Record>> {
            self.fetches.lock().push((offset, limit));
            let end = (offset + limit).min(self.total);
            Ok((offset.min(end)..end)
                .map(|i| Record {
                    model: ModelKind::Credential,
                    id: i.to_string(),
                    score: Some(1.0),
                    fields: BTreeMap::new(),
                })
                .collect())
        }

        async fn facet_counts(&self, _query: &Query) -> SearchResult<FacetCounts> {
            Ok(FacetCounts::new())
        }
    }

    #[test]
    fn test_window_defaults_to_full_bounded_set() {
        assert_eq!(
            ResultWindow::clamped(None, None, 200),
            ResultWindow { start: 0, end: 200 }
        );
    }

    #[test]
    fn test_window_clamps_and_collapses() {
        assert_eq!(
            ResultWindow::clamped(Some(190), Some(500), 200),
            ResultWindow { start: 190, end: 200 }
        );
        assert!(ResultWindow::clamped(Some(250), None, 200).is_empty());
        assert!(ResultWindow::clamped(Some(10), Some(5), 200).is_empty());
        assert!(ResultWindow::clamped(None, None, 0).is_empty());
    }

    #[tokio::test]
    async fn test_count_is_capped() {
        let backend = StubBackend::new(500);
        let query = Query::new(vec![], 200);
        let bounded = BoundedQuery::new(&backend, &query, "test");

        assert_eq!(bounded.count().await.unwrap(), 200);
        assert_eq!(bounded.len().await.unwrap(), 200);
    }

    #[tokio::test]
    async fn test_count_below_ceiling_is_untouched() {
        let backend = StubBackend::new(7);
        let query = Query::new(vec![], 200);
        let bounded = BoundedQuery::new(&backend, &query, "test");

        assert_eq!(bounded.count().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_full_fetch_stops_at_ceiling() {
        let backend = StubBackend::new(500);
        let query = Query::new(vec![], 200);
        let bounded = BoundedQuery::new(&backend, &query, "test");

        let records = bounded.fetch_window(None, None).await.unwrap();
        assert_eq!(records.len(), 200);
        assert_eq!(*backend.fetches.lock(), vec![(0, 200)]);
    }

    #[tokio::test]
    async fn test_window_past_ceiling_never_reaches_backend() {
        let backend = StubBackend::new(500);
        let query = Query::new(vec![], 200);
        let bounded = BoundedQuery::new(&backend, &query, "test");

        let records = bounded.fetch_window(Some(250), Some(260)).await.unwrap();
        assert!(records.is_empty());
        assert!(backend.fetches.lock().is_empty());

        let tail = bounded.fetch_window(Some(195), Some(300)).await.unwrap();
        assert_eq!(tail.len(), 5);
        assert_eq!(*backend.fetches.lock(), vec![(195, 5)]);
    }
}
