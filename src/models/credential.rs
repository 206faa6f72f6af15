use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Organisation that issues credentials
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct Issuer {
    #[validate(length(min = 1))]
    pub id: String,

    /// Decentralised identifier of the issuer
    pub did: String,

    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[serde(default)]
    pub abbreviation: Option<String>,
}

/// A kind of credential published by an issuer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct CredentialType {
    #[validate(length(min = 1))]
    pub id: String,

    pub description: String,

    #[validate(nested)]
    pub issuer: Issuer,
}

/// A `type::value` classification attached to a credential
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    #[serde(rename = "type")]
    pub category_type: String,
    pub value: String,
}

impl Category {
    pub fn new(category_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            category_type: category_type.into(),
            value: value.into(),
        }
    }

    /// Compound key as indexed: `type::value`
    pub fn key(&self) -> String {
        format!("{}::{}", self.category_type, self.value)
    }
}

/// A credential held by a topic
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct Credential {
    #[validate(length(min = 1))]
    pub id: String,

    /// External credential identifier
    pub credential_id: String,

    #[validate(nested)]
    pub credential_type: CredentialType,

    #[validate(length(min = 1))]
    pub topic_id: String,

    /// Names carried by this credential
    #[serde(default)]
    pub names: Vec<String>,

    #[serde(default)]
    pub categories: Vec<Category>,

    pub effective_date: DateTime<Utc>,

    #[serde(default)]
    pub revoked: bool,

    #[serde(default)]
    pub revoked_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub inactive: bool,

    #[serde(default = "default_latest")]
    pub latest: bool,
}

fn default_latest() -> bool {
    true
}

impl Credential {
    pub fn new(
        id: impl Into<String>,
        credential_type: CredentialType,
        topic_id: impl Into<String>,
        effective_date: DateTime<Utc>,
    ) -> Self {
        let id = id.into();
        Self {
            credential_id: id.clone(),
            id,
            credential_type,
            topic_id: topic_id.into(),
            names: Vec::new(),
            categories: Vec::new(),
            effective_date,
            revoked: false,
            revoked_date: None,
            inactive: false,
            latest: true,
        }
    }
}
