//! Search backend abstraction and its Tantivy implementation

use crate::metrics::SEARCH_BACKEND_ERRORS_TOTAL;
use crate::models::ModelKind;
use crate::search::document::fields;
use crate::search::error::{SearchError, SearchResult};
use crate::search::index::IndexManager;
use crate::search::query::{Query, QueryBuilder, SortField, SortOrder};
use async_trait::async_trait;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tantivy::collector::{Count, FacetCollector, TopDocs};
use tantivy::schema::{Facet, OwnedValue, Schema};
use tantivy::{DocAddress, DocId, Order, Score, SegmentReader, TantivyDocument};

/// One backend hit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub model: ModelKind,
    pub id: String,
    /// Relevance score; absent when results were ordered by a field
    pub score: Option<f32>,
    /// Stored field values; multi-valued fields are always arrays
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl Record {
    /// First string value of a stored field
    pub fn text(&self, field: &str) -> Option<&str> {
        match self.fields.get(field)? {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Array(values) => values.first().and_then(|v| v.as_str()),
            _ => None,
        }
    }
}

/// One counted facet value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FacetValue {
    pub value: String,
    pub count: u64,
}

/// Facet field name to counted values, count descending then value ascending
pub type FacetCounts = BTreeMap<String, Vec<FacetValue>>;

/// Operations the search façade needs from a full-text engine
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Total number of matching documents, unbounded
    async fn count(&self, query: &Query) -> SearchResult<usize>;

    /// Materialize `limit` hits starting at `offset`, in the query's primary sort order
    async fn fetch(&self, query: &Query, offset: usize, limit: usize) -> SearchResult<Vec<Record>>;

    /// Counts for every facet the query declares
    async fn facet_counts(&self, query: &Query) -> SearchResult<FacetCounts>;
}

/// Backend over the local Tantivy index
pub struct TantivyBackend {
    index: Arc<IndexManager>,
}

impl TantivyBackend {
    pub fn new(index: Arc<IndexManager>) -> Self {
        Self { index }
    }

    fn query_builder(&self) -> QueryBuilder {
        QueryBuilder::new(self.index.schema().clone(), self.index.index().clone())
    }

    fn record_failure<T>(op: &str, result: SearchResult<T>) -> SearchResult<T> {
        if let Err(ref e) = result {
            SEARCH_BACKEND_ERRORS_TOTAL.with_label_values(&[op]).inc();
            tracing::error!(op = op, error = %e, "Search backend operation failed");
        }
        result
    }

    fn run_count(&self, query: &Query) -> SearchResult<usize> {
        let tantivy_query = self.query_builder().build(query)?;
        let searcher = self.index.reader().searcher();
        Ok(searcher.search(&*tantivy_query, &Count)?)
    }

    fn run_fetch(&self, query: &Query, offset: usize, limit: usize) -> SearchResult<Vec<Record>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let tantivy_query = self.query_builder().build(query)?;
        let searcher = self.index.reader().searcher();
        let sort = query.primary_sort();
        if query.sort.len() > 1 {
            tracing::debug!(
                ignored = query.sort.len() - 1,
                "Only the primary sort directive is applied"
            );
        }

        let top_docs = TopDocs::with_limit(limit).and_offset(offset);
        let hits: Vec<(Option<Score>, DocAddress)> = match (sort.field, sort.order) {
            (SortField::Score, SortOrder::Descending) => searcher
                .search(&*tantivy_query, &top_docs)?
                .into_iter()
                .map(|(score, address)| (Some(score), address))
                .collect(),
            (SortField::Score, SortOrder::Ascending) => {
                let collector = top_docs.tweak_score(move |_segment_reader: &SegmentReader| {
                    move |_doc: DocId, score: Score| -score
                });
                searcher
                    .search(&*tantivy_query, &collector)?
                    .into_iter()
                    .map(|(negated, address)| (Some(-negated), address))
                    .collect()
            }
            (field, order) => {
                let fast_field = field.fast_field().ok_or_else(|| {
                    SearchError::SchemaError(format!("'{}' is not sortable", field))
                })?;
                let order = match order {
                    SortOrder::Ascending => Order::Asc,
                    SortOrder::Descending => Order::Desc,
                };
                let collector = top_docs.order_by_fast_field::<i64>(fast_field, order);
                searcher
                    .search(&*tantivy_query, &collector)?
                    .into_iter()
                    .map(|(_, address)| (None, address))
                    .collect()
            }
        };

        let schema = self.index.schema();
        hits.into_iter()
            .map(|(score, address)| {
                let doc: TantivyDocument = searcher.doc(address)?;
                to_record(schema, &doc, score)
            })
            .collect()
    }

    fn run_facet_counts(&self, query: &Query) -> SearchResult<FacetCounts> {
        let mut counts = FacetCounts::new();
        if query.facets.is_empty() {
            return Ok(counts);
        }

        let tantivy_query = self.query_builder().build(query)?;
        let searcher = self.index.reader().searcher();

        for facet in &query.facets {
            let root = Facet::from_path([facet.field.as_str()]);
            let mut collector = FacetCollector::for_field(facet.field.clone());
            collector.add_facet(root.clone());
            let collected = searcher.search(&*tantivy_query, &collector)?;

            let mut values: Vec<FacetValue> = collected
                .get(&root.to_path_string())
                .filter(|(_, count)| *count >= facet.min_count)
                .filter_map(|(value, count)| {
                    value.to_path().last().map(|v| FacetValue {
                        value: (*v).to_string(),
                        count,
                    })
                })
                .collect();
            values.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
            values.truncate(facet.limit);

            counts.insert(facet.field.clone(), values);
        }

        Ok(counts)
    }
}

#[async_trait]
impl SearchBackend for TantivyBackend {
    async fn count(&self, query: &Query) -> SearchResult<usize> {
        Self::record_failure("count", self.run_count(query))
    }

    async fn fetch(&self, query: &Query, offset: usize, limit: usize) -> SearchResult<Vec<Record>> {
        Self::record_failure("fetch", self.run_fetch(query, offset, limit))
    }

    async fn facet_counts(&self, query: &Query) -> SearchResult<FacetCounts> {
        Self::record_failure("facet_counts", self.run_facet_counts(query))
    }
}

fn to_record(schema: &Schema, doc: &TantivyDocument, score: Option<Score>) -> SearchResult<Record> {
    let stored_text = |name: &str| -> Option<String> {
        let field = schema.get_field(name).ok()?;
        match doc.get_first(field)? {
            OwnedValue::Str(s) => Some(s.clone()),
            _ => None,
        }
    };

    let model = stored_text(fields::MODEL)
        .and_then(|kind| kind.parse::<ModelKind>().ok())
        .ok_or_else(|| SearchError::SearchFailed("document without a model kind".to_string()))?;
    let id = stored_text(fields::RECORD_ID)
        .ok_or_else(|| SearchError::SearchFailed("document without a record id".to_string()))?;

    let mut values = BTreeMap::new();
    for (field, entry) in schema.fields() {
        let name = entry.name();
        if !entry.is_stored() || fields::IDENTITY.contains(&name) {
            continue;
        }

        let converted: Vec<serde_json::Value> = doc.get_all(field).filter_map(to_json).collect();
        if fields::MULTI_VALUED.contains(&name) {
            values.insert(name.to_string(), serde_json::Value::Array(converted));
        } else if let Some(first) = converted.into_iter().next() {
            values.insert(name.to_string(), first);
        }
    }

    Ok(Record {
        model,
        id,
        score,
        fields: values,
    })
}

fn to_json(value: &OwnedValue) -> Option<serde_json::Value> {
    match value {
        OwnedValue::Str(s) => Some(serde_json::Value::String(s.clone())),
        OwnedValue::Bool(b) => Some(serde_json::Value::Bool(*b)),
        OwnedValue::I64(i) => Some(serde_json::Value::from(*i)),
        OwnedValue::Facet(facet) => facet
            .to_path()
            .last()
            .map(|v| serde_json::Value::String((*v).to_string())),
        OwnedValue::Date(date) => chrono::DateTime::from_timestamp(date.into_timestamp_secs(), 0)
            .map(|d| serde_json::Value::String(d.to_rfc3339_opts(SecondsFormat::Secs, true))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Credential, CredentialType, Issuer};
    use crate::search::config::SearchConfig;
    use crate::search::document::{CredentialDocument, SearchDocument, TopicContext};
    use crate::search::query::{Clause, FacetField, SortDirective};
    use chrono::{TimeZone, Utc};

    fn credential(id: &str, name: &str, category: &str, day: u32) -> CredentialDocument {
        let mut credential = Credential::new(
            id,
            CredentialType {
                id: "ct1".to_string(),
                description: "Registration".to_string(),
                issuer: Issuer {
                    id: "i1".to_string(),
                    did: "did:sov:i1".to_string(),
                    name: "Registries".to_string(),
                    abbreviation: None,
                },
            },
            format!("t{}", id),
            Utc.with_ymd_and_hms(2020, 1, day, 0, 0, 0).unwrap(),
        );
        credential.names.push(name.to_string());
        credential.categories.push(Category::new("entity_type", category));
        CredentialDocument::new(credential, TopicContext::default(), vec!["ct1".to_string()])
    }

    async fn backend() -> TantivyBackend {
        let manager = IndexManager::new(SearchConfig::default()).await.unwrap();
        let docs = [
            credential("1", "Alpha Holdings", "BC", 3),
            credential("2", "Alpha Alpha Foods", "BC", 1),
            credential("3", "Beta Logistics", "ULC", 2),
        ];
        let refs: Vec<&(dyn SearchDocument + Sync)> =
            docs.iter().map(|d| d as &(dyn SearchDocument + Sync)).collect();
        manager.index_documents(&refs).await.unwrap();
        TantivyBackend::new(Arc::new(manager))
    }

    fn name_query(text: &str) -> Query {
        Query::new(vec![ModelKind::Credential], 200).narrow(Clause::Text {
            fields: vec![fields::NAME.to_string()],
            text: text.to_string(),
        })
    }

    #[tokio::test]
    async fn test_count_and_fetch_by_relevance() {
        let backend = backend().await;
        let query = name_query("alpha");

        assert_eq!(backend.count(&query).await.unwrap(), 2);

        let records = backend.fetch(&query, 0, 10).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].model, ModelKind::Credential);
        assert!(records.iter().all(|r| r.score.is_some()));
        assert_eq!(
            records[0].fields.get(fields::CATEGORY),
            Some(&serde_json::json!(["entity_type::BC"]))
        );
    }

    #[tokio::test]
    async fn test_fetch_by_effective_date() {
        let backend = backend().await;
        let query = Query::new(vec![ModelKind::Credential], 200).with_sort(vec![SortDirective::new(
            SortField::EffectiveDate,
            SortOrder::Descending,
        )]);

        let ids: Vec<String> = backend
            .fetch(&query, 0, 10)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["1", "3", "2"]);

        let page = backend.fetch(&query, 1, 1).await.unwrap();
        assert_eq!(page[0].id, "3");
        assert_eq!(page[0].text(fields::EFFECTIVE_DATE), Some("2020-01-02T00:00:00Z"));
    }

    #[tokio::test]
    async fn test_zero_limit_fetches_nothing() {
        let backend = backend().await;
        let query = Query::new(vec![], 200);
        assert!(backend.fetch(&query, 0, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_facet_counts_are_ordered() {
        let backend = backend().await;
        let query = Query::new(vec![ModelKind::Credential], 200).with_facet(FacetField {
            field: fields::CATEGORY.to_string(),
            limit: 10,
            min_count: 1,
        });

        let counts = backend.facet_counts(&query).await.unwrap();
        assert_eq!(
            counts[fields::CATEGORY],
            vec![
                FacetValue {
                    value: "entity_type::BC".to_string(),
                    count: 2
                },
                FacetValue {
                    value: "entity_type::ULC".to_string(),
                    count: 1
                },
            ]
        );
    }
}
