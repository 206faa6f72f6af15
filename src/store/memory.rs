use crate::error::Result;
use crate::models::{Credential, Model, ModelKind};
use crate::store::ModelStore;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory model store
#[derive(Clone)]
pub struct InMemoryStore {
    models: Arc<DashMap<(ModelKind, String), Model>>,
    credentials_by_topic: Arc<DashMap<String, Vec<String>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            models: Arc::new(DashMap::new()),
            credentials_by_topic: Arc::new(DashMap::new()),
        }
    }

    fn unlink_credential(&self, credential: &Credential) {
        if let Some(mut entry) = self.credentials_by_topic.get_mut(&credential.topic_id) {
            entry.retain(|id| id != &credential.id);
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelStore for InMemoryStore {
    async fn save(&self, model: Model) -> Result<()> {
        let key = (model.kind(), model.id().to_string());

        if let Some(Model::Credential(previous)) = self.models.get(&key).map(|e| e.value().clone()) {
            self.unlink_credential(&previous);
        }

        if let Model::Credential(ref credential) = model {
            self.credentials_by_topic
                .entry(credential.topic_id.clone())
                .or_default()
                .push(credential.id.clone());
        }

        tracing::debug!(kind = %key.0, id = %key.1, "Model saved");
        self.models.insert(key, model);
        Ok(())
    }

    async fn get(&self, kind: ModelKind, id: &str) -> Result<Option<Model>> {
        Ok(self
            .models
            .get(&(kind, id.to_string()))
            .map(|entry| entry.value().clone()))
    }

    async fn load_many(&self, kind: ModelKind, ids: &[String]) -> Result<HashMap<String, Model>> {
        let mut loaded = HashMap::with_capacity(ids.len());
        for id in ids {
            if let Some(entry) = self.models.get(&(kind, id.clone())) {
                loaded.insert(id.clone(), entry.value().clone());
            }
        }
        Ok(loaded)
    }

    async fn credentials_for_topic(&self, topic_id: &str) -> Result<Vec<Credential>> {
        let ids = self
            .credentials_by_topic
            .get(topic_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();

        Ok(ids
            .iter()
            .filter_map(|id| {
                match self.models.get(&(ModelKind::Credential, id.clone())) {
                    Some(entry) => match entry.value() {
                        Model::Credential(c) => Some(c.clone()),
                        _ => None,
                    },
                    None => None,
                }
            })
            .collect())
    }

    async fn delete(&self, kind: ModelKind, id: &str) -> Result<Option<Model>> {
        let removed = self.models.remove(&(kind, id.to_string())).map(|(_, model)| model);
        if let Some(Model::Credential(ref credential)) = removed {
            self.unlink_credential(credential);
        }
        if removed.is_some() {
            tracing::debug!(kind = %kind, id = %id, "Model deleted");
        }
        Ok(removed)
    }

    async fn count(&self, kind: ModelKind) -> Result<usize> {
        Ok(self.models.iter().filter(|entry| entry.key().0 == kind).count())
    }
}
