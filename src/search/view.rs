//! Search views: which models, which pipelines, which serializer

use crate::models::ModelKind;
use crate::search::config::SearchConfig;
use crate::search::document::fields;
use crate::search::filters::{FilterStage, Pipeline, StatusDimension, StatusValue};
use crate::search::query::{Query, SortDirective, SortField};
use serde::Serialize;
use strum::{Display, EnumString};

/// How hits are turned into response records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Serializer {
    /// Name, address or topic suggestions
    Autocomplete,
    /// Full credential as stored
    Credential,
    /// Full credential with its topic nested
    CredentialTopic,
    /// Topic summary
    Topic,
}

/// Fields counted by the facets endpoint
pub const FACET_FIELDS: [&str; 3] = [fields::CATEGORY, fields::CREDENTIAL_TYPE_ID, fields::ISSUER_ID];

/// One search endpoint
#[derive(Debug, Clone)]
pub struct SearchView {
    /// Name used in logs and metric labels
    pub name: &'static str,
    pub models: Vec<ModelKind>,
    pub pipeline: Pipeline,
    /// Pipeline for the facet query; `None` when the view has no facets
    pub facet_pipeline: Option<Pipeline>,
    /// Resolve hits to store models before serializing
    pub load_all: bool,
    pub serializer: Serializer,
    pub facet_objects_serializer: Serializer,
    /// Reject list requests with neither a usable name nor a topic id
    pub require_topic_criteria: bool,
}

impl SearchView {
    /// Unfiltered query over this view's models
    pub fn base_query(&self, ceiling: usize) -> Query {
        Query::new(self.models.clone(), ceiling)
    }

    /// Suggestions over names, addresses and topics
    pub fn autocomplete() -> Self {
        Self {
            name: "autocomplete",
            models: vec![ModelKind::Address, ModelKind::Name, ModelKind::Topic],
            pipeline: Pipeline::new(vec![
                FilterStage::Autocomplete,
                FilterStage::Status {
                    dimensions: vec![
                        StatusDimension::new("inactive", fields::INACTIVE, StatusValue::Any),
                        StatusDimension::new("revoked", fields::REVOKED, StatusValue::False),
                    ],
                },
                relevance_only(),
            ]),
            facet_pipeline: None,
            load_all: true,
            serializer: Serializer::Autocomplete,
            facet_objects_serializer: Serializer::Autocomplete,
            require_topic_criteria: false,
        }
    }

    /// Credential search with facets
    pub fn credential_search(config: &SearchConfig) -> Self {
        Self {
            name: "credential_search",
            models: vec![ModelKind::Credential],
            pipeline: Pipeline::new(vec![
                FilterStage::Name,
                FilterStage::Category,
                credential_exact(),
                credential_status(),
                FilterStage::Ordering {
                    allowed: vec![SortField::EffectiveDate, SortField::RevokedDate, SortField::Score],
                    default: SortDirective::relevance(),
                },
            ]),
            facet_pipeline: Some(Pipeline::new(vec![
                FilterStage::Name,
                credential_exact(),
                credential_status(),
                FilterStage::Facets {
                    fields: FACET_FIELDS.to_vec(),
                    limit: config.facet_limit,
                    min_count: 1,
                },
            ])),
            load_all: true,
            serializer: Serializer::Credential,
            facet_objects_serializer: Serializer::Credential,
            require_topic_criteria: false,
        }
    }

    /// Credential search with each credential's topic nested; needs a name or topic id
    pub fn credential_topic_search(config: &SearchConfig) -> Self {
        Self {
            name: "credential_topic_search",
            serializer: Serializer::CredentialTopic,
            facet_objects_serializer: Serializer::CredentialTopic,
            require_topic_criteria: true,
            ..Self::credential_search(config)
        }
    }

    /// Topic search served from stored index fields
    pub fn topics() -> Self {
        Self {
            name: "topics",
            models: vec![ModelKind::Topic],
            pipeline: Pipeline::new(vec![
                FilterStage::Name,
                FilterStage::Exact {
                    params: vec![fields::CREDENTIAL_TYPE_ID, fields::ISSUER_ID, fields::TOPIC_ID],
                },
                FilterStage::Status {
                    dimensions: vec![
                        StatusDimension::new("inactive", fields::INACTIVE, StatusValue::False),
                        StatusDimension::new("revoked", fields::REVOKED, StatusValue::False),
                    ],
                },
                relevance_only(),
            ]),
            facet_pipeline: None,
            load_all: false,
            serializer: Serializer::Topic,
            facet_objects_serializer: Serializer::Topic,
            require_topic_criteria: false,
        }
    }
}

fn relevance_only() -> FilterStage {
    FilterStage::Ordering {
        allowed: vec![SortField::Score],
        default: SortDirective::relevance(),
    }
}

fn credential_exact() -> FilterStage {
    FilterStage::Exact {
        params: vec![
            fields::CREDENTIAL_TYPE_ID,
            fields::TOPIC_CREDENTIAL_TYPE_ID,
            fields::ISSUER_ID,
            fields::TOPIC_ID,
        ],
    }
}

fn credential_status() -> FilterStage {
    FilterStage::Status {
        dimensions: vec![
            StatusDimension::new("inactive", fields::INACTIVE, StatusValue::False),
            StatusDimension::new("latest", fields::LATEST, StatusValue::True),
            StatusDimension::new("revoked", fields::REVOKED, StatusValue::False),
        ],
    }
}

/// Every view the HTTP surface serves, built once at startup
#[derive(Debug, Clone)]
pub struct SearchViews {
    pub autocomplete: SearchView,
    pub credential_search: SearchView,
    pub credentials: SearchView,
    pub topics: SearchView,
}

impl SearchViews {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            autocomplete: SearchView::autocomplete(),
            credential_search: SearchView::credential_search(config),
            credentials: SearchView::credential_topic_search(config),
            topics: SearchView::topics(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::filters::RequestParams;
    use crate::search::query::Clause;

    #[test]
    fn test_facet_pipeline_skips_category_narrowing() {
        let view = SearchView::credential_topic_search(&SearchConfig::default());
        let params: RequestParams = [("category", "entity_type::BC")].into_iter().collect();

        let facet_query = view
            .facet_pipeline
            .as_ref()
            .unwrap()
            .apply(view.base_query(200), &params);
        let result_query = view.pipeline.apply(view.base_query(200), &params);

        let category = Clause::exact(fields::CATEGORY, "entity_type::BC");
        assert!(!facet_query.clauses.contains(&category));
        assert!(result_query.clauses.contains(&category));
        assert_eq!(facet_query.facets.len(), FACET_FIELDS.len());
    }

    #[test]
    fn test_autocomplete_leaves_inactive_unset() {
        let view = SearchView::autocomplete();
        let query = view.pipeline.apply(view.base_query(200), &RequestParams::default());
        assert_eq!(query.clauses, vec![Clause::flag(fields::REVOKED, false)]);
        assert!(view.load_all);
    }

    #[test]
    fn test_only_topic_mode_requires_topic_criteria() {
        let views = SearchViews::new(&SearchConfig::default());
        assert!(views.credentials.require_topic_criteria);
        assert!(!views.credential_search.require_topic_criteria);
        assert!(!views.topics.require_topic_criteria);
        assert!(!views.topics.load_all);
        assert!(views.autocomplete.facet_pipeline.is_none());
    }

    #[test]
    fn test_credential_views_share_pipelines() {
        let config = SearchConfig::default();
        let base = SearchView::credential_search(&config);
        let topic = SearchView::credential_topic_search(&config);

        assert_eq!(base.pipeline, topic.pipeline);
        assert_eq!(base.facet_pipeline, topic.facet_pipeline);
        assert_eq!(base.serializer, Serializer::Credential);
        assert_eq!(topic.serializer, Serializer::CredentialTopic);
        assert_ne!(base.name, topic.name);
    }
}
