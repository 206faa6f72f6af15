//! Response assembly: backend hits to serialized records

use crate::error::Result;
use crate::models::{Category, Credential, CredentialType, Model, ModelKind, Topic};
use crate::search::backend::Record;
use crate::search::document::fields;
use crate::search::view::Serializer;
use crate::store::ModelStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Autocomplete suggestion
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AutocompleteResult {
    #[serde(rename = "type")]
    pub kind: ModelKind,
    pub value: String,
    pub score: Option<f32>,
    pub topic_id: String,
    pub topic_source_id: Option<String>,
    pub topic_type: Option<String>,
    pub credential_id: Option<String>,
}

/// Topic summary
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TopicResult {
    pub id: String,
    pub source_id: String,
    #[serde(rename = "type")]
    pub topic_type: String,
    pub names: Vec<String>,
    pub inactive: bool,
    pub revoked: bool,
}

impl From<&Topic> for TopicResult {
    fn from(topic: &Topic) -> Self {
        Self {
            id: topic.id.clone(),
            source_id: topic.source_id.clone(),
            topic_type: topic.topic_type.clone(),
            names: topic.names.clone(),
            inactive: topic.inactive,
            revoked: topic.revoked,
        }
    }
}

/// Topic as nested in a credential result
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NestedTopic {
    pub id: String,
    pub source_id: String,
    #[serde(rename = "type")]
    pub topic_type: String,
    pub names: Vec<String>,
}

/// Credential with its topic, for topic-oriented searches
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CredentialTopicResult {
    pub id: String,
    pub credential_id: String,
    pub credential_type: CredentialType,
    pub topic: Option<NestedTopic>,
    pub names: Vec<String>,
    pub categories: Vec<Category>,
    pub effective_date: DateTime<Utc>,
    pub inactive: bool,
    pub latest: bool,
    pub revoked: bool,
    pub revoked_date: Option<DateTime<Utc>>,
}

/// Turns backend hits into response records
pub struct ResponseAssembler<'a> {
    store: &'a dyn ModelStore,
}

impl<'a> ResponseAssembler<'a> {
    pub fn new(store: &'a dyn ModelStore) -> Self {
        Self { store }
    }

    /// Serialize hits in order. With `load_all`, hits whose model is gone from
    /// the store are dropped.
    pub async fn assemble(
        &self,
        serializer: Serializer,
        load_all: bool,
        records: Vec<Record>,
    ) -> Result<Vec<serde_json::Value>> {
        if !load_all {
            return records
                .iter()
                .filter_map(|record| from_record(serializer, record))
                .collect();
        }

        let resolved = self.resolve(records).await?;
        match serializer {
            Serializer::CredentialTopic => self.credential_topic_results(resolved).await,
            _ => resolved
                .iter()
                .filter_map(|(record, model)| from_model(serializer, record, model))
                .collect(),
        }
    }

    /// Batch load the model behind each hit, keeping hit order
    async fn resolve(&self, records: Vec<Record>) -> Result<Vec<(Record, Model)>> {
        let mut ids: BTreeMap<ModelKind, Vec<String>> = BTreeMap::new();
        for record in &records {
            ids.entry(record.model).or_default().push(record.id.clone());
        }

        let mut loaded: HashMap<ModelKind, HashMap<String, Model>> = HashMap::new();
        for (kind, kind_ids) in ids {
            loaded.insert(kind, self.store.load_many(kind, &kind_ids).await?);
        }

        Ok(records
            .into_iter()
            .filter_map(|record| {
                let model = loaded
                    .get(&record.model)
                    .and_then(|models| models.get(&record.id))
                    .cloned();
                match model {
                    Some(model) => Some((record, model)),
                    None => {
                        tracing::warn!(
                            kind = %record.model,
                            id = %record.id,
                            "Search hit has no backing model, dropping"
                        );
                        None
                    }
                }
            })
            .collect())
    }

    async fn credential_topic_results(
        &self,
        resolved: Vec<(Record, Model)>,
    ) -> Result<Vec<serde_json::Value>> {
        let credentials: Vec<Credential> = resolved
            .into_iter()
            .filter_map(|(_, model)| match model {
                Model::Credential(credential) => Some(credential),
                other => {
                    tracing::warn!(kind = %other.kind(), id = %other.id(), "Not a credential, dropping");
                    None
                }
            })
            .collect();

        let mut topic_ids: Vec<String> = credentials.iter().map(|c| c.topic_id.clone()).collect();
        topic_ids.sort();
        topic_ids.dedup();
        let topics = self.store.load_many(ModelKind::Topic, &topic_ids).await?;

        credentials
            .into_iter()
            .map(|credential| -> Result<serde_json::Value> {
                let topic = match topics.get(&credential.topic_id) {
                    Some(Model::Topic(topic)) => Some(NestedTopic {
                        id: topic.id.clone(),
                        source_id: topic.source_id.clone(),
                        topic_type: topic.topic_type.clone(),
                        names: topic.names.clone(),
                    }),
                    _ => None,
                };
                let result = CredentialTopicResult {
                    id: credential.id,
                    credential_id: credential.credential_id,
                    credential_type: credential.credential_type,
                    topic,
                    names: credential.names,
                    categories: credential.categories,
                    effective_date: credential.effective_date,
                    inactive: credential.inactive,
                    latest: credential.latest,
                    revoked: credential.revoked,
                    revoked_date: credential.revoked_date,
                };
                Ok(serde_json::to_value(result)?)
            })
            .collect()
    }
}

fn from_model(
    serializer: Serializer,
    record: &Record,
    model: &Model,
) -> Option<Result<serde_json::Value>> {
    let value = match (serializer, model) {
        (Serializer::Autocomplete, model) => serde_json::to_value(autocomplete_from_model(record, model)),
        (Serializer::Credential, Model::Credential(credential)) => serde_json::to_value(credential),
        (Serializer::Topic, Model::Topic(topic)) => serde_json::to_value(TopicResult::from(topic)),
        (serializer, model) => {
            tracing::warn!(
                serializer = %serializer,
                kind = %model.kind(),
                "Serializer does not handle model kind, dropping"
            );
            return None;
        }
    };
    Some(value.map_err(Into::into))
}

fn from_record(serializer: Serializer, record: &Record) -> Option<Result<serde_json::Value>> {
    let value = match serializer {
        Serializer::Topic => serde_json::to_value(topic_from_record(record)),
        Serializer::Autocomplete => serde_json::to_value(autocomplete_from_record(record)),
        Serializer::Credential | Serializer::CredentialTopic => {
            tracing::warn!(id = %record.id, "Credential results need loaded models, dropping");
            return None;
        }
    };
    Some(value.map_err(Into::into))
}

fn autocomplete_from_model(record: &Record, model: &Model) -> AutocompleteResult {
    let (value, credential_id) = match model {
        Model::Name(name) => (name.text.clone(), name.credential_id.clone()),
        Model::Address(address) => (address.formatted(), address.credential_id.clone()),
        Model::Topic(topic) => (topic.source_id.clone(), None),
        Model::Credential(credential) => (
            credential
                .names
                .first()
                .cloned()
                .unwrap_or_else(|| credential.credential_id.clone()),
            Some(credential.id.clone()),
        ),
    };

    AutocompleteResult {
        kind: model.kind(),
        value,
        score: record.score,
        topic_id: model.topic_id().to_string(),
        topic_source_id: record.text(fields::TOPIC_SOURCE_ID).map(str::to_string),
        topic_type: record.text(fields::TOPIC_TYPE).map(str::to_string),
        credential_id,
    }
}

fn autocomplete_from_record(record: &Record) -> AutocompleteResult {
    let value = match record.model {
        ModelKind::Address => record.text(fields::ADDRESS),
        ModelKind::Topic => record.text(fields::TOPIC_SOURCE_ID),
        _ => record.text(fields::NAME),
    };

    AutocompleteResult {
        kind: record.model,
        value: value.unwrap_or_default().to_string(),
        score: record.score,
        topic_id: record.text(fields::TOPIC_ID).unwrap_or_default().to_string(),
        topic_source_id: record.text(fields::TOPIC_SOURCE_ID).map(str::to_string),
        topic_type: record.text(fields::TOPIC_TYPE).map(str::to_string),
        credential_id: record.text(fields::CREDENTIAL_ID).map(str::to_string),
    }
}

fn topic_from_record(record: &Record) -> TopicResult {
    let flag = |name: &str| {
        record
            .fields
            .get(name)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    };
    let names = match record.fields.get(fields::NAME) {
        Some(serde_json::Value::Array(values)) => values
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    };

    TopicResult {
        id: record.id.clone(),
        source_id: record.text(fields::TOPIC_SOURCE_ID).unwrap_or_default().to_string(),
        topic_type: record.text(fields::TOPIC_TYPE).unwrap_or_default().to_string(),
        names,
        inactive: flag(fields::INACTIVE),
        revoked: flag(fields::REVOKED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Issuer, Name};
    use crate::store::InMemoryStore;
    use serde_json::json;

    fn record(model: ModelKind, id: &str, fields: serde_json::Value) -> Record {
        let fields = match fields {
            serde_json::Value::Object(map) => map.into_iter().collect(),
            _ => BTreeMap::new(),
        };
        Record {
            model,
            id: id.to_string(),
            score: Some(2.5),
            fields,
        }
    }

    fn topic() -> Topic {
        Topic {
            id: "t1".to_string(),
            source_id: "BC0001".to_string(),
            topic_type: "registration".to_string(),
            names: vec!["Alpha Ltd".to_string()],
            addresses: vec![],
            inactive: false,
            revoked: false,
        }
    }

    #[tokio::test]
    async fn test_topic_results_from_stored_fields() {
        let store = InMemoryStore::new();
        let assembler = ResponseAssembler::new(&store);
        let hit = record(
            ModelKind::Topic,
            "t1",
            json!({
                "topic_source_id": "BC0001",
                "topic_type": "registration",
                "name": ["Alpha Ltd"],
                "inactive": false,
                "revoked": false
            }),
        );

        let results = assembler.assemble(Serializer::Topic, false, vec![hit]).await.unwrap();
        assert_eq!(
            results,
            vec![json!({
                "id": "t1",
                "source_id": "BC0001",
                "type": "registration",
                "names": ["Alpha Ltd"],
                "inactive": false,
                "revoked": false
            })]
        );
    }

    #[tokio::test]
    async fn test_missing_models_are_dropped() {
        let store = InMemoryStore::new();
        store
            .save(Model::Name(Name {
                id: "n1".to_string(),
                text: "Alpha Ltd".to_string(),
                credential_id: Some("c1".to_string()),
                topic_id: "t1".to_string(),
                inactive: false,
                revoked: false,
            }))
            .await
            .unwrap();

        let assembler = ResponseAssembler::new(&store);
        let hits = vec![
            record(ModelKind::Name, "gone", json!({})),
            record(ModelKind::Name, "n1", json!({"topic_source_id": "BC0001"})),
        ];

        let results = assembler
            .assemble(Serializer::Autocomplete, true, hits)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["type"], "name");
        assert_eq!(results[0]["value"], "Alpha Ltd");
        assert_eq!(results[0]["topic_source_id"], "BC0001");
        assert_eq!(results[0]["credential_id"], "c1");
        assert_eq!(results[0]["score"], 2.5);
    }

    #[tokio::test]
    async fn test_credential_results_nest_their_topic() {
        let store = InMemoryStore::new();
        store.save(Model::Topic(topic())).await.unwrap();
        let credential = Credential::new(
            "c1",
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
            "t1",
            Utc::now(),
        );
        store.save(Model::Credential(credential)).await.unwrap();

        let assembler = ResponseAssembler::new(&store);
        let results = assembler
            .assemble(
                Serializer::CredentialTopic,
                true,
                vec![record(ModelKind::Credential, "c1", json!({}))],
            )
            .await
            .unwrap();

        assert_eq!(results[0]["topic"]["source_id"], "BC0001");
        assert_eq!(results[0]["credential_type"]["issuer"]["did"], "did:sov:i1");
        assert_eq!(results[0]["latest"], true);
    }

    #[tokio::test]
    async fn test_plain_credential_results_keep_topic_id() {
        let store = InMemoryStore::new();
        store.save(Model::Topic(topic())).await.unwrap();
        let mut credential = Credential::new(
            "c1",
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
            "t1",
            Utc::now(),
        );
        credential.names.push("Alpha Holdings".to_string());
        store.save(Model::Credential(credential)).await.unwrap();

        let assembler = ResponseAssembler::new(&store);
        let hit = || vec![record(ModelKind::Credential, "c1", json!({}))];

        let results = assembler.assemble(Serializer::Credential, true, hit()).await.unwrap();
        assert_eq!(results[0]["topic_id"], "t1");
        assert_eq!(results[0]["names"], json!(["Alpha Holdings"]));
        assert!(results[0].get("topic").is_none());

        // stored fields alone cannot build a credential
        let results = assembler.assemble(Serializer::Credential, false, hit()).await.unwrap();
        assert!(results.is_empty());
    }
}
