//! Faceted search: counts from a less restricted query next to the results

use crate::search::backend::{FacetCounts, SearchBackend};
use crate::search::bounded::BoundedQuery;
use crate::search::document::fields;
use crate::search::error::SearchResult;
use crate::search::filters::{parse_category, RequestParams};
use crate::search::pagination::Page;
use crate::search::query::{Clause, Query};
use crate::search::view::SearchView;
use serde::Serialize;

/// Parameters that narrow the facet query, one clause per supplied value
pub const FACET_NARROWING_KEYS: [&str; 4] = [
    fields::CATEGORY,
    fields::CREDENTIAL_TYPE_ID,
    fields::TOPIC_CREDENTIAL_TYPE_ID,
    fields::ISSUER_ID,
];

/// Add an exact clause for every non-empty selected facet value. Repeated
/// values of one key are AND-combined like every other clause.
pub fn narrow_by_selection(query: Query, params: &RequestParams) -> Query {
    FACET_NARROWING_KEYS.iter().fold(query, |query, key| {
        params
            .get_all(key)
            .into_iter()
            .filter_map(|value| selected_value(key, value))
            .fold(query, |query, value| query.narrow(Clause::exact(*key, value)))
    })
}

/// Categories are normalised the way the category filter reads them, so a
/// value the result query ignores never narrows the facet counts either
fn selected_value(key: &str, value: &str) -> Option<String> {
    if key == fields::CATEGORY {
        return parse_category(value);
    }
    (!value.trim().is_empty()).then(|| value.to_string())
}

/// The two queries a facets request runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetPlan {
    /// Facet pipeline plus selection narrowing; only counted
    pub facet_query: Query,
    /// Full pipeline; paginated into the response objects
    pub result_query: Query,
}

impl FacetPlan {
    /// `None` when the view has no facet pipeline
    pub fn new(view: &SearchView, ceiling: usize, params: &RequestParams) -> Option<Self> {
        let facet_pipeline = view.facet_pipeline.as_ref()?;
        let base = view.base_query(ceiling);

        let facet_query = narrow_by_selection(facet_pipeline.apply(base.clone(), params), params);
        let result_query = view.pipeline.apply(base, params);

        Some(Self {
            facet_query,
            result_query,
        })
    }

    /// Count facets on the facet query
    pub async fn facet_counts(
        &self,
        backend: &dyn SearchBackend,
        view: &str,
    ) -> SearchResult<FacetCounts> {
        BoundedQuery::new(backend, &self.facet_query, view)
            .facet_counts()
            .await
    }
}

/// Facet counts merged with a page of results
#[derive(Debug, Clone, Serialize)]
pub struct FacetResponse<T> {
    pub facets: FacetCounts,
    pub objects: Page<T>,
}
