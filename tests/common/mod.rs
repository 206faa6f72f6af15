//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;
use vcr_search::search::{SearchConfig, SearchService};
use vcr_search::store::{Fixtures, InMemoryStore};

/// Six topics. Five hold an active "Alpha" registration that also trades as
/// "Al's ..."; topic 6 only holds a revoked one. Topics 1 and 2 are
/// `entity_type::A`, the rest `entity_type::B`.
pub const FIXTURES: &str = r#"{
    "topics": [
        {"id": "1", "source_id": "BC0001", "type": "registration", "names": ["Alpha Holdings"]},
        {"id": "2", "source_id": "BC0002", "type": "registration", "names": ["Alpha Lumber"]},
        {"id": "3", "source_id": "BC0003", "type": "registration", "names": ["Alpha Mining"]},
        {"id": "4", "source_id": "BC0004", "type": "registration", "names": ["Alpha Foods"]},
        {"id": "5", "source_id": "BC0005", "type": "registration", "names": ["Alpha Transit"]},
        {"id": "6", "source_id": "BC0006", "type": "registration", "names": ["Alpha Closed"], "revoked": true}
    ],
    "credentials": [
        {"id": "c1", "credential_id": "c1", "topic_id": "1", "names": ["Alpha Holdings", "Al's Holdings"],
         "credential_type": {"id": "ct1", "description": "Registration",
            "issuer": {"id": "i1", "did": "did:sov:i1", "name": "Registries"}},
         "categories": [{"type": "entity_type", "value": "A"}],
         "effective_date": "2020-01-01T00:00:00Z"},
        {"id": "c2", "credential_id": "c2", "topic_id": "2", "names": ["Alpha Lumber", "Al's Lumber"],
         "credential_type": {"id": "ct1", "description": "Registration",
            "issuer": {"id": "i1", "did": "did:sov:i1", "name": "Registries"}},
         "categories": [{"type": "entity_type", "value": "A"}],
         "effective_date": "2020-02-01T00:00:00Z"},
        {"id": "c3", "credential_id": "c3", "topic_id": "3", "names": ["Alpha Mining", "Al's Mining"],
         "credential_type": {"id": "ct1", "description": "Registration",
            "issuer": {"id": "i1", "did": "did:sov:i1", "name": "Registries"}},
         "categories": [{"type": "entity_type", "value": "B"}],
         "effective_date": "2020-03-01T00:00:00Z"},
        {"id": "c4", "credential_id": "c4", "topic_id": "4", "names": ["Alpha Foods", "Al's Foods"],
         "credential_type": {"id": "ct1", "description": "Registration",
            "issuer": {"id": "i1", "did": "did:sov:i1", "name": "Registries"}},
         "categories": [{"type": "entity_type", "value": "B"}],
         "effective_date": "2020-04-01T00:00:00Z"},
        {"id": "c5", "credential_id": "c5", "topic_id": "5", "names": ["Alpha Transit", "Al's Transit"],
         "credential_type": {"id": "ct2", "description": "Business Number",
            "issuer": {"id": "i2", "did": "did:sov:i2", "name": "Revenue Agency"}},
         "categories": [{"type": "entity_type", "value": "B"}],
         "effective_date": "2020-05-01T00:00:00Z"},
        {"id": "c6", "credential_id": "c6", "topic_id": "6", "names": ["Alpha Closed"],
         "credential_type": {"id": "ct1", "description": "Registration",
            "issuer": {"id": "i1", "did": "did:sov:i1", "name": "Registries"}},
         "categories": [{"type": "entity_type", "value": "B"}],
         "effective_date": "2019-01-01T00:00:00Z",
         "revoked": true, "revoked_date": "2021-01-01T00:00:00Z", "latest": false}
    ],
    "names": [
        {"id": "n1", "text": "Alpha Holdings", "credential_id": "c1", "topic_id": "1"},
        {"id": "n2", "text": "Alpha Lumber", "credential_id": "c2", "topic_id": "2"},
        {"id": "n6", "text": "Alpha Closed", "credential_id": "c6", "topic_id": "6", "revoked": true}
    ],
    "addresses": [
        {"id": "a1", "civic_address": "100 Alpine Way", "city": "Victoria",
         "province": "BC", "postal_code": "V8V 1A1", "country": "Canada",
         "credential_id": "c1", "topic_id": "1"}
    ]
}"#;

/// In-RAM search service seeded with [`FIXTURES`]
pub async fn seeded_service() -> SearchService {
    seeded_service_with(SearchConfig::default()).await
}

pub async fn seeded_service_with(config: SearchConfig) -> SearchService {
    let service = SearchService::new(config, Arc::new(InMemoryStore::new()))
        .await
        .unwrap();
    let fixtures = Fixtures::from_json(FIXTURES).unwrap();
    service.index_fixtures(fixtures).await.unwrap();
    service
}
