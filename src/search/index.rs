//! Search index management

use crate::search::config::SearchConfig;
use crate::search::document::{build_search_schema, fields, SearchDocument};
use crate::search::error::{SearchError, SearchResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tantivy::collector::Count;
use tantivy::schema::Schema;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, Term};
use tokio::sync::RwLock;

/// Index statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Total number of documents in the index
    pub total_documents: u64,

    /// Index size in bytes (0 for in-RAM indexes)
    pub index_size_bytes: u64,

    /// Number of segments
    pub num_segments: usize,
}

/// Manages the Tantivy search index
pub struct IndexManager {
    /// The Tantivy index
    index: Index,

    /// The schema
    schema: Schema,

    /// Index writer (wrapped in RwLock for thread-safety)
    writer: Arc<RwLock<IndexWriter>>,

    /// Index reader, reloaded after every commit
    reader: IndexReader,

    /// Configuration
    config: SearchConfig,
}

impl IndexManager {
    /// Create a new IndexManager
    pub async fn new(config: SearchConfig) -> SearchResult<Self> {
        let schema = build_search_schema();

        let index = match config.index_path {
            Some(ref path) => {
                // Create index directory if it doesn't exist
                std::fs::create_dir_all(path).map_err(|e| {
                    SearchError::IndexInitFailed(format!("Failed to create index directory: {}", e))
                })?;

                if Self::index_exists(path) {
                    Index::open_in_dir(path).map_err(|e| {
                        SearchError::IndexInitFailed(format!("Failed to open existing index: {}", e))
                    })?
                } else {
                    Index::create_in_dir(path, schema.clone()).map_err(|e| {
                        SearchError::IndexInitFailed(format!("Failed to create new index: {}", e))
                    })?
                }
            }
            None => Index::create_in_ram(schema.clone()),
        };

        let writer = index
            .writer(config.writer_heap_size)
            .map_err(|e| SearchError::IndexInitFailed(format!("Failed to create writer: {}", e)))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| SearchError::IndexInitFailed(format!("Failed to create reader: {}", e)))?;

        tracing::info!(
            path = ?config.index_path,
            in_memory = config.index_path.is_none(),
            "Search index opened"
        );

        Ok(Self {
            index,
            schema,
            writer: Arc::new(RwLock::new(writer)),
            reader,
            config,
        })
    }

    /// Check if an index exists at the given path
    fn index_exists(path: &Path) -> bool {
        path.join("meta.json").exists()
    }

    /// Get the schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Get the index
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Get the reader
    pub fn reader(&self) -> &IndexReader {
        &self.reader
    }

    /// Index (or replace) a batch of documents and commit
    pub async fn index_documents(
        &self,
        documents: &[&(dyn SearchDocument + Sync)],
    ) -> SearchResult<usize> {
        let mut writer = self.writer.write().await;
        let id_field = self
            .schema
            .get_field(fields::DOC_ID)
            .map_err(|e| SearchError::SchemaError(e.to_string()))?;
        let mut indexed = 0;

        for document in documents {
            // Delete existing document with same ID
            writer.delete_term(Term::from_field_text(id_field, &document.document_id()));

            writer
                .add_document(document.to_tantivy_doc(&self.schema))
                .map_err(|e| {
                    SearchError::IndexingFailed(format!(
                        "Failed to add document {}: {}",
                        document.document_id(),
                        e
                    ))
                })?;

            indexed += 1;
        }

        writer
            .commit()
            .map_err(|e| SearchError::IndexingFailed(format!("Failed to commit batch: {}", e)))?;
        self.reader.reload()?;

        tracing::debug!(documents = indexed, "Index batch committed");
        Ok(indexed)
    }

    /// Delete a document by its index-wide ID
    pub async fn delete_document(&self, document_id: &str) -> SearchResult<()> {
        let mut writer = self.writer.write().await;

        if let Ok(id_field) = self.schema.get_field(fields::DOC_ID) {
            writer.delete_term(Term::from_field_text(id_field, document_id));
            writer.commit().map_err(|e| {
                SearchError::IndexingFailed(format!("Failed to commit deletion: {}", e))
            })?;
            self.reader.reload()?;
        }

        Ok(())
    }

    /// Commit pending changes
    pub async fn commit(&self) -> SearchResult<()> {
        let mut writer = self.writer.write().await;
        writer
            .commit()
            .map_err(|e| SearchError::IndexingFailed(format!("Failed to commit: {}", e)))?;
        self.reader.reload()?;
        Ok(())
    }

    /// Clear the entire index
    pub async fn clear_index(&self) -> SearchResult<()> {
        let mut writer = self.writer.write().await;
        writer.delete_all_documents().map_err(|e| {
            SearchError::IndexingFailed(format!("Failed to clear index: {}", e))
        })?;
        writer
            .commit()
            .map_err(|e| SearchError::IndexingFailed(format!("Failed to commit clear: {}", e)))?;
        self.reader.reload()?;
        Ok(())
    }

    /// Get index statistics
    pub async fn get_stats(&self) -> SearchResult<IndexStats> {
        let searcher = self.reader.searcher();

        let total_documents = searcher
            .search(&tantivy::query::AllQuery, &Count)
            .map_err(|e| SearchError::SearchFailed(format!("Failed to count documents: {}", e)))?
            as u64;

        let num_segments = searcher.segment_readers().len();

        // Calculate approximate index size
        let index_size_bytes = match self.config.index_path {
            Some(ref path) => std::fs::read_dir(path)
                .map(|entries| {
                    entries
                        .filter_map(|e| e.ok())
                        .filter_map(|e| e.metadata().ok())
                        .map(|m| m.len())
                        .sum()
                })
                .unwrap_or(0),
            None => 0,
        };

        Ok(IndexStats {
            total_documents,
            index_size_bytes,
            num_segments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Topic;
    use crate::search::document::TopicDocument;
    use tempfile::TempDir;

    fn topic(id: &str) -> TopicDocument {
        TopicDocument::new(
            Topic {
                id: id.to_string(),
                source_id: format!("BC{}", id),
                topic_type: "registration".to_string(),
                names: vec![format!("Company {}", id)],
                addresses: vec![],
                inactive: false,
                revoked: false,
            },
            &[],
        )
    }

    #[tokio::test]
    async fn test_index_creation_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let config = SearchConfig {
            index_path: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };

        let manager = IndexManager::new(config).await;
        assert!(manager.is_ok());
        assert!(temp_dir.path().join("meta.json").exists());
    }

    #[tokio::test]
    async fn test_reindexing_replaces_documents() {
        let manager = IndexManager::new(SearchConfig::default()).await.unwrap();

        let first = topic("1");
        let second = topic("2");
        manager.index_documents(&[&first, &second]).await.unwrap();
        manager.index_documents(&[&first]).await.unwrap();

        let stats = manager.get_stats().await.unwrap();
        assert_eq!(stats.total_documents, 2);
        assert_eq!(stats.index_size_bytes, 0);
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let manager = IndexManager::new(SearchConfig::default()).await.unwrap();
        let first = topic("1");
        let second = topic("2");
        manager.index_documents(&[&first, &second]).await.unwrap();

        manager.delete_document("topic.1").await.unwrap();
        assert_eq!(manager.get_stats().await.unwrap().total_documents, 1);

        manager.clear_index().await.unwrap();
        assert_eq!(manager.get_stats().await.unwrap().total_documents, 0);
    }
}
