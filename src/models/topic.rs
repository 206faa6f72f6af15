use serde::{Deserialize, Serialize};
use validator::Validate;

/// The subject credentials are issued about (an organisation, a person, ...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct Topic {
    #[validate(length(min = 1))]
    pub id: String,

    /// Identifier assigned by the issuing registry
    #[validate(length(min = 1))]
    pub source_id: String,

    #[serde(rename = "type")]
    pub topic_type: String,

    #[serde(default)]
    pub names: Vec<String>,

    #[serde(default)]
    pub addresses: Vec<String>,

    #[serde(default)]
    pub inactive: bool,

    #[serde(default)]
    pub revoked: bool,
}

/// A name carried by a credential
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct Name {
    #[validate(length(min = 1))]
    pub id: String,

    #[validate(length(min = 1))]
    pub text: String,

    #[serde(default)]
    pub credential_id: Option<String>,

    #[validate(length(min = 1))]
    pub topic_id: String,

    #[serde(default)]
    pub inactive: bool,

    #[serde(default)]
    pub revoked: bool,
}

/// A postal address carried by a credential
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct Address {
    #[validate(length(min = 1))]
    pub id: String,

    #[serde(default)]
    pub civic_address: String,

    #[serde(default)]
    pub city: String,

    #[serde(default)]
    pub province: String,

    #[serde(default)]
    pub postal_code: String,

    #[serde(default)]
    pub country: String,

    #[serde(default)]
    pub credential_id: Option<String>,

    #[validate(length(min = 1))]
    pub topic_id: String,

    #[serde(default)]
    pub inactive: bool,

    #[serde(default)]
    pub revoked: bool,
}

impl Address {
    /// Single-line rendering used for display and autocomplete
    pub fn formatted(&self) -> String {
        [
            self.civic_address.as_str(),
            self.city.as_str(),
            self.province.as_str(),
            self.postal_code.as_str(),
            self.country.as_str(),
        ]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_formatting_skips_blank_parts() {
        let address = Address {
            id: "a1".to_string(),
            civic_address: "1 Main St".to_string(),
            city: "Victoria".to_string(),
            province: " ".to_string(),
            postal_code: String::new(),
            country: "CA".to_string(),
            credential_id: None,
            topic_id: "t1".to_string(),
            inactive: false,
            revoked: false,
        };
        assert_eq!(address.formatted(), "1 Main St, Victoria, CA");
    }
}
