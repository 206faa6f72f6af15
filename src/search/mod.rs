//! Bounded, faceted full-text search powered by Tantivy
//!
//! This module sits between HTTP requests and the search index:
//!
//! - **Filter Pipelines**: request parameters become narrowing clauses, one stage at a time
//! - **Result Ceiling**: counts and windows never exceed `search.max_results`
//! - **Faceted Search**: counts from a less restricted query next to the results
//! - **Topic Criteria**: topic-oriented searches need a name or a topic id
//! - **Response Assembly**: hits resolved to store models, or read from stored fields
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │           Search Service API                     │
//! ├─────────────────────────────────────────────────┤
//! │  - list()           - facets()                  │
//! │  - index_*()        - delete()                  │
//! └─────────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────────┐
//! │   Pipeline → BoundedQuery → ResponseAssembler   │
//! └─────────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────────────┐
//! │     SearchBackend (TantivyBackend)              │
//! ├─────────────────────────────────────────────────┤
//! │  - Index Manager (writer lock, manual reload)   │
//! │  - Shared schema for every model kind           │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vcr_search::search::{RequestParams, SearchConfig, SearchService, SearchViews};
//! use vcr_search::store::InMemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SearchConfig::default();
//!     let views = SearchViews::new(&config);
//!     let search = SearchService::new(config, Arc::new(InMemoryStore::new())).await?;
//!
//!     let params: RequestParams = [("name", "alpha")].into_iter().collect();
//!     let page = search.list(&views.credentials, &params).await?;
//!     println!("Found {} credentials", page.total);
//!
//!     Ok(())
//! }
//! ```

mod assembler;
mod backend;
mod bounded;
mod config;
mod document;
mod error;
mod facets;
mod filters;
mod index;
mod pagination;
mod query;
mod service;
mod validation;
mod view;

pub use assembler::{
    AutocompleteResult, CredentialTopicResult, NestedTopic, ResponseAssembler, TopicResult,
};
pub use backend::{FacetCounts, FacetValue, Record, SearchBackend, TantivyBackend};
pub use bounded::{BoundedQuery, ResultWindow};
pub use config::{SearchConfig, SearchConfigBuilder};
pub use document::{
    build_search_schema, document_id, fields, AddressDocument, CredentialDocument, NameDocument,
    SearchDocument, TopicContext, TopicDocument,
};
pub use error::{SearchError, SearchResult};
pub use facets::{narrow_by_selection, FacetPlan, FacetResponse, FACET_NARROWING_KEYS};
pub use filters::{FilterStage, Pipeline, RequestParams, StatusDimension, StatusValue};
pub use index::{IndexManager, IndexStats};
pub use pagination::{Page, PageRequest, INVALID_PAGE};
pub use query::{
    Clause, FacetField, Query, QueryBuilder, SortDirective, SortField, SortOrder,
};
pub use service::SearchService;
pub use validation::{valid_search_query, MIN_NAME_LENGTH};
pub use view::{SearchView, SearchViews, Serializer, FACET_FIELDS};
