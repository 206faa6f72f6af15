//! Main search service implementation

use crate::error::{AppError, Result};
use crate::metrics::INDEXED_DOCUMENTS;
use crate::models::{Address, Credential, Model, ModelKind, Name, Topic};
use crate::search::assembler::ResponseAssembler;
use crate::search::backend::{SearchBackend, TantivyBackend};
use crate::search::bounded::BoundedQuery;
use crate::search::config::SearchConfig;
use crate::search::document::{
    document_id, AddressDocument, CredentialDocument, NameDocument, SearchDocument, TopicContext,
    TopicDocument,
};
use crate::search::facets::{FacetPlan, FacetResponse};
use crate::search::filters::RequestParams;
use crate::search::index::{IndexManager, IndexStats};
use crate::search::pagination::{Page, PageRequest};
use crate::search::query::Query;
use crate::search::validation::valid_search_query;
use crate::search::view::{SearchView, Serializer};
use crate::store::{Fixtures, ModelStore};
use std::collections::HashMap;
use std::sync::Arc;

type BoxedDocument = Box<dyn SearchDocument + Send + Sync>;

/// Main search service
pub struct SearchService {
    /// Index manager
    index_manager: Arc<IndexManager>,

    /// Query execution
    backend: Arc<dyn SearchBackend>,

    /// Models behind the index
    store: Arc<dyn ModelStore>,

    /// Configuration
    config: SearchConfig,
}

impl SearchService {
    /// Create a new search service over a Tantivy index
    pub async fn new(config: SearchConfig, store: Arc<dyn ModelStore>) -> Result<Self> {
        let index_manager = Arc::new(IndexManager::new(config.clone()).await?);
        let backend: Arc<dyn SearchBackend> = Arc::new(TantivyBackend::new(index_manager.clone()));

        Ok(Self {
            index_manager,
            backend,
            store,
            config,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ModelStore> {
        &self.store
    }

    /// One page of a view's results
    pub async fn list(
        &self,
        view: &SearchView,
        params: &RequestParams,
    ) -> Result<Page<serde_json::Value>> {
        if view.require_topic_criteria
            && !valid_search_query(params.get("name"), params.get("topic_id"))
        {
            return Err(AppError::MissingTopicParameters);
        }

        let query = view
            .pipeline
            .apply(view.base_query(self.config.max_results), params);
        tracing::debug!(view = view.name, clauses = query.clauses.len(), "Running search");

        self.paginate(view, &query, view.serializer, params).await
    }

    /// Facet counts from the facet query plus one page of the full query
    pub async fn facets(
        &self,
        view: &SearchView,
        params: &RequestParams,
    ) -> Result<FacetResponse<serde_json::Value>> {
        let plan = FacetPlan::new(view, self.config.max_results, params)
            .ok_or_else(|| AppError::NotFound(format!("{} has no facets", view.name)))?;

        let facets = plan.facet_counts(self.backend.as_ref(), view.name).await?;
        let objects = self
            .paginate(view, &plan.result_query, view.facet_objects_serializer, params)
            .await?;

        Ok(FacetResponse { facets, objects })
    }

    async fn paginate(
        &self,
        view: &SearchView,
        query: &Query,
        serializer: Serializer,
        params: &RequestParams,
    ) -> Result<Page<serde_json::Value>> {
        let bounded = BoundedQuery::new(self.backend.as_ref(), query, view.name);
        let total = bounded.count().await?;

        let request = PageRequest::from_params(params, &self.config)?;
        let (start, end) = request.window(total)?;
        let records = bounded.fetch_window(Some(start), Some(end)).await?;

        let results = ResponseAssembler::new(self.store.as_ref())
            .assemble(serializer, view.load_all, records)
            .await?;

        Ok(Page::new(request, total, results))
    }

    /// Store and index a topic
    pub async fn index_topic(&self, topic: Topic) -> Result<()> {
        let topic_id = topic.id.clone();
        self.store.save(Model::Topic(topic)).await?;
        self.reindex_topic(&topic_id).await
    }

    /// Store and index a credential; the owning topic's documents are refreshed too
    pub async fn index_credential(&self, credential: Credential) -> Result<()> {
        let previous_topic = match self.store.get(ModelKind::Credential, &credential.id).await? {
            Some(Model::Credential(previous)) if previous.topic_id != credential.topic_id => {
                Some(previous.topic_id)
            }
            _ => None,
        };

        let topic_id = credential.topic_id.clone();
        self.store.save(Model::Credential(credential)).await?;

        if let Some(previous) = previous_topic {
            self.reindex_topic(&previous).await?;
        }
        self.reindex_topic(&topic_id).await
    }

    /// Store and index a name
    pub async fn index_name(&self, name: Name) -> Result<()> {
        let topic = self.topic_context(&name.topic_id).await?;
        self.store.save(Model::Name(name.clone())).await?;
        self.write(vec![Box::new(NameDocument { name, topic }) as BoxedDocument]).await?;
        Ok(())
    }

    /// Store and index an address
    pub async fn index_address(&self, address: Address) -> Result<()> {
        let topic = self.topic_context(&address.topic_id).await?;
        self.store.save(Model::Address(address.clone())).await?;
        self.write(vec![Box::new(AddressDocument { address, topic }) as BoxedDocument]).await?;
        Ok(())
    }

    /// Load a fixture batch into the store and index it in a single commit
    pub async fn index_fixtures(&self, fixtures: Fixtures) -> Result<usize> {
        for model in fixtures.clone().into_models() {
            self.store.save(model).await?;
        }

        let topics: HashMap<&str, &Topic> =
            fixtures.topics.iter().map(|t| (t.id.as_str(), t)).collect();
        let context = |topic_id: &str| {
            topics
                .get(topic_id)
                .map(|t| TopicContext::from(*t))
                .unwrap_or_default()
        };

        let mut documents: Vec<BoxedDocument> = Vec::with_capacity(fixtures.len());
        for topic in &fixtures.topics {
            documents.extend(self.topic_documents(topic.clone()).await?);
        }
        for name in &fixtures.names {
            documents.push(Box::new(NameDocument {
                name: name.clone(),
                topic: context(&name.topic_id),
            }));
        }
        for address in &fixtures.addresses {
            documents.push(Box::new(AddressDocument {
                address: address.clone(),
                topic: context(&address.topic_id),
            }));
        }

        let indexed = self.write(documents).await?;
        tracing::info!(documents = indexed, "Fixtures indexed");
        Ok(indexed)
    }

    /// Remove a model from the store and the index. Returns false when it was unknown.
    pub async fn delete(&self, kind: ModelKind, id: &str) -> Result<bool> {
        let removed = self.store.delete(kind, id).await?;
        self.index_manager
            .delete_document(&document_id(kind, id))
            .await?;

        match removed {
            Some(Model::Credential(credential)) => {
                self.reindex_topic(&credential.topic_id).await?;
                Ok(true)
            }
            Some(_) => Ok(true),
            None => Ok(false),
        }
    }

    /// Commit pending index changes
    pub async fn commit(&self) -> Result<()> {
        Ok(self.index_manager.commit().await?)
    }

    /// Drop every document from the index; the store is untouched
    pub async fn clear_index(&self) -> Result<()> {
        self.index_manager.clear_index().await?;
        INDEXED_DOCUMENTS.set(0.0);
        Ok(())
    }

    /// Get index statistics
    pub async fn get_stats(&self) -> Result<IndexStats> {
        let stats = self.index_manager.get_stats().await?;
        INDEXED_DOCUMENTS.set(stats.total_documents as f64);
        Ok(stats)
    }

    /// Rebuild the documents of a topic and all of its credentials
    async fn reindex_topic(&self, topic_id: &str) -> Result<()> {
        let documents = match self.store.get(ModelKind::Topic, topic_id).await? {
            Some(Model::Topic(topic)) => self.topic_documents(topic).await?,
            _ => {
                tracing::warn!(topic_id = %topic_id, "Topic not in store, indexing credentials without it");
                let credentials = self.store.credentials_for_topic(topic_id).await?;
                credential_documents(&credentials, TopicContext::default())
            }
        };
        self.write(documents).await?;
        Ok(())
    }

    async fn topic_documents(&self, topic: Topic) -> Result<Vec<BoxedDocument>> {
        let credentials = self.store.credentials_for_topic(&topic.id).await?;
        let mut documents = credential_documents(&credentials, TopicContext::from(&topic));
        documents.push(Box::new(TopicDocument::new(topic, &credentials)));
        Ok(documents)
    }

    async fn topic_context(&self, topic_id: &str) -> Result<TopicContext> {
        Ok(match self.store.get(ModelKind::Topic, topic_id).await? {
            Some(Model::Topic(topic)) => TopicContext::from(&topic),
            _ => TopicContext::default(),
        })
    }

    async fn write(&self, documents: Vec<BoxedDocument>) -> Result<usize> {
        if documents.is_empty() {
            return Ok(0);
        }
        let refs: Vec<&(dyn SearchDocument + Sync)> = documents
            .iter()
            .map(|d| d.as_ref() as &(dyn SearchDocument + Sync))
            .collect();

        match self.index_manager.index_documents(&refs).await {
            Ok(indexed) => Ok(indexed),
            Err(e) => {
                crate::metrics::SEARCH_BACKEND_ERRORS_TOTAL
                    .with_label_values(&["index"])
                    .inc();
                Err(e.into())
            }
        }
    }
}

/// Credential documents for one topic; each carries the types of all its siblings
fn credential_documents(credentials: &[Credential], topic: TopicContext) -> Vec<BoxedDocument> {
    let mut type_ids: Vec<String> = credentials
        .iter()
        .map(|c| c.credential_type.id.clone())
        .collect();
    type_ids.sort();
    type_ids.dedup();

    credentials
        .iter()
        .map(|credential| {
            Box::new(CredentialDocument::new(
                credential.clone(),
                topic.clone(),
                type_ids.clone(),
            )) as BoxedDocument
        })
        .collect()
}
