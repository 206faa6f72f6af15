pub mod credential;
pub mod topic;

pub use credential::*;
pub use topic::*;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Kinds of domain objects that appear in the search index
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ModelKind {
    Credential,
    Topic,
    Name,
    Address,
}

impl ModelKind {
    /// Every indexed model kind
    pub const ALL: [ModelKind; 4] = [
        ModelKind::Credential,
        ModelKind::Topic,
        ModelKind::Name,
        ModelKind::Address,
    ];
}

/// A fully loaded domain object, as resolved by the model store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum Model {
    Credential(Credential),
    Topic(Topic),
    Name(Name),
    Address(Address),
}

impl Model {
    pub fn kind(&self) -> ModelKind {
        match self {
            Model::Credential(_) => ModelKind::Credential,
            Model::Topic(_) => ModelKind::Topic,
            Model::Name(_) => ModelKind::Name,
            Model::Address(_) => ModelKind::Address,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Model::Credential(c) => &c.id,
            Model::Topic(t) => &t.id,
            Model::Name(n) => &n.id,
            Model::Address(a) => &a.id,
        }
    }

    /// Topic the object belongs to
    pub fn topic_id(&self) -> &str {
        match self {
            Model::Credential(c) => &c.topic_id,
            Model::Topic(t) => &t.id,
            Model::Name(n) => &n.topic_id,
            Model::Address(a) => &a.topic_id,
        }
    }
}
