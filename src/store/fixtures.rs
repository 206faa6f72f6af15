//! JSON fixtures used to seed the model store and the search index

use crate::error::{AppError, Result};
use crate::models::{Address, Credential, Model, Name, Topic};
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

/// A batch of domain objects to load at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Fixtures {
    #[serde(default)]
    #[validate(nested)]
    pub topics: Vec<Topic>,

    #[serde(default)]
    #[validate(nested)]
    pub credentials: Vec<Credential>,

    #[serde(default)]
    #[validate(nested)]
    pub names: Vec<Name>,

    #[serde(default)]
    #[validate(nested)]
    pub addresses: Vec<Address>,
}

impl Fixtures {
    /// Read and validate fixtures from a JSON file
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Parse and validate fixtures from a JSON string
    pub fn from_json(raw: &str) -> Result<Self> {
        let fixtures: Fixtures = serde_json::from_str(raw)?;
        fixtures.validate()?;
        fixtures.check_references()?;
        Ok(fixtures)
    }

    /// Every credential, name and address must point at a known topic
    fn check_references(&self) -> Result<()> {
        let known = |topic_id: &str| self.topics.iter().any(|t| t.id == topic_id);

        let dangling = self
            .credentials
            .iter()
            .map(|c| (c.id.as_str(), c.topic_id.as_str()))
            .chain(self.names.iter().map(|n| (n.id.as_str(), n.topic_id.as_str())))
            .chain(self.addresses.iter().map(|a| (a.id.as_str(), a.topic_id.as_str())))
            .find(|(_, topic_id)| !known(topic_id));

        match dangling {
            Some((id, topic_id)) => Err(AppError::Validation(format!(
                "record {} references unknown topic {}",
                id, topic_id
            ))),
            None => Ok(()),
        }
    }

    /// Flatten into store models, topics first
    pub fn into_models(self) -> Vec<Model> {
        self.topics
            .into_iter()
            .map(Model::Topic)
            .chain(self.credentials.into_iter().map(Model::Credential))
            .chain(self.names.into_iter().map(Model::Name))
            .chain(self.addresses.into_iter().map(Model::Address))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.topics.len() + self.credentials.len() + self.names.len() + self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "topics": [
            {"id": "1", "source_id": "BC0001", "type": "registration", "names": ["Alpha Ltd"]}
        ],
        "credentials": [
            {
                "id": "10",
                "credential_id": "cred-10",
                "credential_type": {
                    "id": "3",
                    "description": "Registration",
                    "issuer": {"id": "7", "did": "did:sov:7", "name": "Registries"}
                },
                "topic_id": "1",
                "names": ["Alpha Ltd"],
                "categories": [{"type": "entity_type", "value": "BC"}],
                "effective_date": "2020-01-01T00:00:00Z"
            }
        ],
        "names": [{"id": "100", "text": "Alpha Ltd", "credential_id": "10", "topic_id": "1"}]
    }"#;

    #[test]
    fn test_parse_sample_fixtures() {
        let fixtures = Fixtures::from_json(SAMPLE).unwrap();
        assert_eq!(fixtures.len(), 3);
        assert!(fixtures.credentials[0].latest);
        assert!(!fixtures.credentials[0].revoked);

        let models = fixtures.into_models();
        assert!(matches!(models[0], Model::Topic(_)));
    }

    #[test]
    fn test_dangling_topic_reference_is_rejected() {
        let raw = r#"{
            "topics": [],
            "names": [{"id": "100", "text": "Alpha", "topic_id": "404"}]
        }"#;
        let err = Fixtures::from_json(raw).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_empty_ids_fail_validation() {
        let raw = r#"{"topics": [{"id": "", "source_id": "X", "type": "t"}]}"#;
        assert!(Fixtures::from_json(raw).is_err());
    }
}
