//! Search document structures and indexing

use crate::models::{Address, Credential, ModelKind, Name, Topic};
use chrono::{DateTime, Utc};
use tantivy::schema::*;
use tantivy::TantivyDocument;

/// Field names of the shared search schema
pub mod fields {
    pub const DOC_ID: &str = "doc_id";
    pub const MODEL: &str = "model";
    pub const RECORD_ID: &str = "record_id";
    pub const NAME: &str = "name";
    pub const ADDRESS: &str = "address";
    pub const AUTOCOMPLETE: &str = "autocomplete";
    pub const CREDENTIAL_ID: &str = "credential_id";
    pub const TOPIC_ID: &str = "topic_id";
    pub const TOPIC_SOURCE_ID: &str = "topic_source_id";
    pub const TOPIC_TYPE: &str = "topic_type";
    pub const CATEGORY: &str = "category";
    pub const CREDENTIAL_TYPE_ID: &str = "credential_type_id";
    pub const TOPIC_CREDENTIAL_TYPE_ID: &str = "topic_credential_type_id";
    pub const ISSUER_ID: &str = "issuer_id";
    pub const INACTIVE: &str = "inactive";
    pub const REVOKED: &str = "revoked";
    pub const LATEST: &str = "latest";
    pub const EFFECTIVE_DATE: &str = "effective_date";
    pub const REVOKED_DATE: &str = "revoked_date";
    pub const EFFECTIVE_SORT: &str = "effective_sort";
    pub const REVOKED_SORT: &str = "revoked_sort";

    /// Stored fields always reported as arrays
    pub const MULTI_VALUED: &[&str] = &[
        NAME,
        CATEGORY,
        CREDENTIAL_TYPE_ID,
        TOPIC_CREDENTIAL_TYPE_ID,
        ISSUER_ID,
    ];

    /// Stored fields that identify the hit rather than describe it
    pub const IDENTITY: &[&str] = &[DOC_ID, MODEL, RECORD_ID];
}

/// Trait for documents that can be indexed and searched
pub trait SearchDocument {
    /// Convert to Tantivy document
    fn to_tantivy_doc(&self, schema: &Schema) -> TantivyDocument;

    /// Kind of model the document stands for
    fn model(&self) -> ModelKind;

    /// ID of the backing model
    fn record_id(&self) -> &str;

    /// Index-wide unique document ID
    fn document_id(&self) -> String {
        document_id(self.model(), self.record_id())
    }
}

pub fn document_id(kind: ModelKind, id: &str) -> String {
    format!("{}.{}", kind, id)
}

/// Denormalized topic attributes copied onto dependent documents
#[derive(Debug, Clone, Default)]
pub struct TopicContext {
    pub source_id: String,
    pub topic_type: String,
}

impl From<&Topic> for TopicContext {
    fn from(topic: &Topic) -> Self {
        Self {
            source_id: topic.source_id.clone(),
            topic_type: topic.topic_type.clone(),
        }
    }
}

/// Credential document for search indexing
#[derive(Debug, Clone)]
pub struct CredentialDocument {
    pub credential: Credential,
    pub topic: TopicContext,
    /// Credential types of every credential owned by the same topic
    pub topic_credential_type_ids: Vec<String>,
}

impl CredentialDocument {
    pub fn new(credential: Credential, topic: TopicContext, topic_credential_type_ids: Vec<String>) -> Self {
        Self {
            credential,
            topic,
            topic_credential_type_ids,
        }
    }
}

impl SearchDocument for CredentialDocument {
    fn to_tantivy_doc(&self, schema: &Schema) -> TantivyDocument {
        let credential = &self.credential;
        let mut doc = base_doc(schema, self);

        for name in &credential.names {
            add_text(&mut doc, schema, fields::NAME, name);
        }
        add_text(&mut doc, schema, fields::CREDENTIAL_ID, &credential.credential_id);
        add_topic(&mut doc, schema, &credential.topic_id, &self.topic);

        for category in &credential.categories {
            add_facet(&mut doc, schema, fields::CATEGORY, &category.key());
        }
        add_facet(&mut doc, schema, fields::CREDENTIAL_TYPE_ID, &credential.credential_type.id);
        add_facet(&mut doc, schema, fields::ISSUER_ID, &credential.credential_type.issuer.id);
        for type_id in &self.topic_credential_type_ids {
            add_facet(&mut doc, schema, fields::TOPIC_CREDENTIAL_TYPE_ID, type_id);
        }

        add_flag(&mut doc, schema, fields::INACTIVE, credential.inactive);
        add_flag(&mut doc, schema, fields::REVOKED, credential.revoked);
        add_flag(&mut doc, schema, fields::LATEST, credential.latest);

        add_date(&mut doc, schema, fields::EFFECTIVE_DATE, &credential.effective_date);
        if let Some(ref revoked_date) = credential.revoked_date {
            add_date(&mut doc, schema, fields::REVOKED_DATE, revoked_date);
        }
        add_sort_keys(
            &mut doc,
            schema,
            credential.effective_date.timestamp(),
            credential.revoked_date.map(|d| d.timestamp()).unwrap_or(0),
        );

        doc
    }

    fn model(&self) -> ModelKind {
        ModelKind::Credential
    }

    fn record_id(&self) -> &str {
        &self.credential.id
    }
}

/// Topic document for search indexing
#[derive(Debug, Clone)]
pub struct TopicDocument {
    pub topic: Topic,
    pub credential_type_ids: Vec<String>,
    pub issuer_ids: Vec<String>,
}

impl TopicDocument {
    /// Build from a topic and the credentials it owns
    pub fn new(topic: Topic, credentials: &[Credential]) -> Self {
        let mut credential_type_ids: Vec<String> = credentials
            .iter()
            .map(|c| c.credential_type.id.clone())
            .collect();
        credential_type_ids.sort();
        credential_type_ids.dedup();

        let mut issuer_ids: Vec<String> = credentials
            .iter()
            .map(|c| c.credential_type.issuer.id.clone())
            .collect();
        issuer_ids.sort();
        issuer_ids.dedup();

        Self {
            topic,
            credential_type_ids,
            issuer_ids,
        }
    }
}

impl SearchDocument for TopicDocument {
    fn to_tantivy_doc(&self, schema: &Schema) -> TantivyDocument {
        let topic = &self.topic;
        let mut doc = base_doc(schema, self);

        for name in &topic.names {
            add_text(&mut doc, schema, fields::NAME, name);
        }
        for address in &topic.addresses {
            add_text(&mut doc, schema, fields::ADDRESS, address);
        }
        add_text(&mut doc, schema, fields::AUTOCOMPLETE, &topic.source_id);
        add_topic(&mut doc, schema, &topic.id, &TopicContext::from(topic));
        for type_id in &self.credential_type_ids {
            add_facet(&mut doc, schema, fields::CREDENTIAL_TYPE_ID, type_id);
        }
        for issuer_id in &self.issuer_ids {
            add_facet(&mut doc, schema, fields::ISSUER_ID, issuer_id);
        }
        add_flag(&mut doc, schema, fields::INACTIVE, topic.inactive);
        add_flag(&mut doc, schema, fields::REVOKED, topic.revoked);
        add_sort_keys(&mut doc, schema, 0, 0);

        doc
    }

    fn model(&self) -> ModelKind {
        ModelKind::Topic
    }

    fn record_id(&self) -> &str {
        &self.topic.id
    }
}

/// Name document, used by autocomplete
#[derive(Debug, Clone)]
pub struct NameDocument {
    pub name: Name,
    pub topic: TopicContext,
}

impl SearchDocument for NameDocument {
    fn to_tantivy_doc(&self, schema: &Schema) -> TantivyDocument {
        let name = &self.name;
        let mut doc = base_doc(schema, self);

        add_text(&mut doc, schema, fields::NAME, &name.text);
        add_text(&mut doc, schema, fields::AUTOCOMPLETE, &name.text);
        if let Some(ref credential_id) = name.credential_id {
            add_text(&mut doc, schema, fields::CREDENTIAL_ID, credential_id);
        }
        add_topic(&mut doc, schema, &name.topic_id, &self.topic);
        add_flag(&mut doc, schema, fields::INACTIVE, name.inactive);
        add_flag(&mut doc, schema, fields::REVOKED, name.revoked);
        add_sort_keys(&mut doc, schema, 0, 0);

        doc
    }

    fn model(&self) -> ModelKind {
        ModelKind::Name
    }

    fn record_id(&self) -> &str {
        &self.name.id
    }
}

/// Address document, used by autocomplete
#[derive(Debug, Clone)]
pub struct AddressDocument {
    pub address: Address,
    pub topic: TopicContext,
}

impl SearchDocument for AddressDocument {
    fn to_tantivy_doc(&self, schema: &Schema) -> TantivyDocument {
        let address = &self.address;
        let formatted = address.formatted();
        let mut doc = base_doc(schema, self);

        add_text(&mut doc, schema, fields::ADDRESS, &formatted);
        add_text(&mut doc, schema, fields::AUTOCOMPLETE, &formatted);
        if let Some(ref credential_id) = address.credential_id {
            add_text(&mut doc, schema, fields::CREDENTIAL_ID, credential_id);
        }
        add_topic(&mut doc, schema, &address.topic_id, &self.topic);
        add_flag(&mut doc, schema, fields::INACTIVE, address.inactive);
        add_flag(&mut doc, schema, fields::REVOKED, address.revoked);
        add_sort_keys(&mut doc, schema, 0, 0);

        doc
    }

    fn model(&self) -> ModelKind {
        ModelKind::Address
    }

    fn record_id(&self) -> &str {
        &self.address.id
    }
}

fn base_doc<D: SearchDocument + ?Sized>(schema: &Schema, document: &D) -> TantivyDocument {
    let mut doc = TantivyDocument::new();
    add_text(&mut doc, schema, fields::DOC_ID, &document.document_id());
    add_text(&mut doc, schema, fields::MODEL, &document.model().to_string());
    add_text(&mut doc, schema, fields::RECORD_ID, document.record_id());
    doc
}

fn add_topic(doc: &mut TantivyDocument, schema: &Schema, topic_id: &str, topic: &TopicContext) {
    add_text(doc, schema, fields::TOPIC_ID, topic_id);
    if !topic.source_id.is_empty() {
        add_text(doc, schema, fields::TOPIC_SOURCE_ID, &topic.source_id);
    }
    if !topic.topic_type.is_empty() {
        add_text(doc, schema, fields::TOPIC_TYPE, &topic.topic_type);
    }
}

fn add_text(doc: &mut TantivyDocument, schema: &Schema, name: &str, value: &str) {
    if let Ok(field) = schema.get_field(name) {
        doc.add_text(field, value);
    }
}

fn add_facet(doc: &mut TantivyDocument, schema: &Schema, name: &str, value: &str) {
    if let Ok(field) = schema.get_field(name) {
        doc.add_facet(field, Facet::from_path([name, value]));
    }
}

fn add_flag(doc: &mut TantivyDocument, schema: &Schema, name: &str, value: bool) {
    if let Ok(field) = schema.get_field(name) {
        doc.add_bool(field, value);
    }
}

fn add_date(doc: &mut TantivyDocument, schema: &Schema, name: &str, value: &DateTime<Utc>) {
    if let Ok(field) = schema.get_field(name) {
        doc.add_date(field, tantivy::DateTime::from_timestamp_secs(value.timestamp()));
    }
}

// Sort keys are written on every document so fast-field ordering never sees a gap.
fn add_sort_keys(doc: &mut TantivyDocument, schema: &Schema, effective: i64, revoked: i64) {
    if let Ok(field) = schema.get_field(fields::EFFECTIVE_SORT) {
        doc.add_i64(field, effective);
    }
    if let Ok(field) = schema.get_field(fields::REVOKED_SORT) {
        doc.add_i64(field, revoked);
    }
}

/// Build the search schema shared by every model kind
pub fn build_search_schema() -> Schema {
    let mut schema_builder = Schema::builder();

    // Identity - stored, indexed as raw strings
    schema_builder.add_text_field(fields::DOC_ID, STRING | STORED);
    schema_builder.add_text_field(fields::MODEL, STRING | STORED);
    schema_builder.add_text_field(fields::RECORD_ID, STRING | STORED);

    // Full-text fields
    schema_builder.add_text_field(fields::NAME, TEXT | STORED);
    schema_builder.add_text_field(fields::ADDRESS, TEXT | STORED);
    schema_builder.add_text_field(fields::AUTOCOMPLETE, TEXT);

    // Identifiers matched verbatim
    schema_builder.add_text_field(fields::CREDENTIAL_ID, STRING | STORED);
    schema_builder.add_text_field(fields::TOPIC_ID, STRING | STORED);
    schema_builder.add_text_field(fields::TOPIC_SOURCE_ID, STRING | STORED);
    schema_builder.add_text_field(fields::TOPIC_TYPE, STRING | STORED);

    // Facets - narrowed verbatim and counted
    let facet_options = FacetOptions::default().set_stored();
    schema_builder.add_facet_field(fields::CATEGORY, facet_options.clone());
    schema_builder.add_facet_field(fields::CREDENTIAL_TYPE_ID, facet_options.clone());
    schema_builder.add_facet_field(fields::TOPIC_CREDENTIAL_TYPE_ID, facet_options.clone());
    schema_builder.add_facet_field(fields::ISSUER_ID, facet_options);

    // Status flags
    schema_builder.add_bool_field(fields::INACTIVE, INDEXED | STORED);
    schema_builder.add_bool_field(fields::REVOKED, INDEXED | STORED);
    schema_builder.add_bool_field(fields::LATEST, INDEXED | STORED);

    // Dates
    schema_builder.add_date_field(fields::EFFECTIVE_DATE, INDEXED | STORED);
    schema_builder.add_date_field(fields::REVOKED_DATE, INDEXED | STORED);

    // Sort keys (unix seconds)
    schema_builder.add_i64_field(fields::EFFECTIVE_SORT, FAST);
    schema_builder.add_i64_field(fields::REVOKED_SORT, FAST);

    schema_builder.build()
}
