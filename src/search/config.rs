//! Search configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Search service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Path to the search index directory; the index lives in RAM when unset
    pub index_path: Option<PathBuf>,

    /// Index writer heap size in bytes (default: 50MB)
    pub writer_heap_size: usize,

    /// Hard ceiling on reported and materialized results (default: 200)
    pub max_results: usize,

    /// Default page size
    pub page_size: usize,

    /// Largest page size a caller may request
    pub max_page_size: usize,

    /// Maximum values reported per facet field
    pub facet_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_path: None,
            writer_heap_size: 50_000_000, // 50MB
            max_results: 200,
            page_size: 10,
            max_page_size: 100,
            facet_limit: 100,
        }
    }
}

/// Builder for SearchConfig
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    pub fn index_path(mut self, path: PathBuf) -> Self {
        self.config.index_path = Some(path);
        self
    }

    pub fn writer_heap_size(mut self, size: usize) -> Self {
        self.config.writer_heap_size = size;
        self
    }

    pub fn max_results(mut self, max: usize) -> Self {
        self.config.max_results = max;
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.config.page_size = size;
        self
    }

    pub fn max_page_size(mut self, size: usize) -> Self {
        self.config.max_page_size = size;
        self
    }

    pub fn facet_limit(mut self, limit: usize) -> Self {
        self.config.facet_limit = limit;
        self
    }

    pub fn build(self) -> SearchConfig {
        self.config
    }
}

impl Default for SearchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ceiling() {
        let config = SearchConfig::default();
        assert_eq!(config.max_results, 200);
        assert!(config.index_path.is_none());
    }

    #[test]
    fn test_builder() {
        let config = SearchConfigBuilder::new()
            .max_results(5)
            .page_size(2)
            .index_path(PathBuf::from("/tmp/idx"))
            .build();
        assert_eq!(config.max_results, 5);
        assert_eq!(config.page_size, 2);
        assert_eq!(config.index_path, Some(PathBuf::from("/tmp/idx")));
    }
}
