//! Search query model and its translation to Tantivy queries

use crate::models::ModelKind;
use crate::search::document::fields;
use crate::search::error::{SearchError, SearchResult};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tantivy::query::{
    AllQuery, BooleanQuery, EmptyQuery, Occur, Query as TantivyQuery, RegexQuery, TermQuery,
};
use tantivy::schema::{Facet, Field, FieldType, IndexRecordOption, Schema};
use tantivy::tokenizer::TokenStream;
use tantivy::{Index, Term};

/// Sort order for search results
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Fields results can be ordered by
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SortField {
    Score,
    EffectiveDate,
    RevokedDate,
}

impl SortField {
    /// Fast field backing the sort, `None` for relevance
    pub fn fast_field(&self) -> Option<&'static str> {
        match self {
            SortField::Score => None,
            SortField::EffectiveDate => Some(fields::EFFECTIVE_SORT),
            SortField::RevokedDate => Some(fields::REVOKED_SORT),
        }
    }
}

/// One backend sort directive
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortDirective {
    pub field: SortField,
    pub order: SortOrder,
}

impl SortDirective {
    pub fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }

    /// Descending relevance
    pub fn relevance() -> Self {
        Self::new(SortField::Score, SortOrder::Descending)
    }

    /// Parse an ordering token such as `-effective_date`
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        let (order, name) = match token.strip_prefix('-') {
            Some(rest) => (SortOrder::Descending, rest),
            None => (SortOrder::Ascending, token),
        };
        name.parse::<SortField>().ok().map(|field| Self { field, order })
    }
}

impl Default for SortDirective {
    fn default() -> Self {
        Self::relevance()
    }
}

/// A narrowing clause
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Clause {
    /// Free text; matches when any of the fields matches. Tokenized fields need every
    /// token, raw fields need the whole trimmed text.
    Text { fields: Vec<String>, text: String },

    /// Verbatim field equality, no tokenization
    Exact { field: String, value: String },

    /// Boolean flag equality
    Flag { field: String, value: bool },

    /// Every token of `text` must be a prefix of some token in `field`
    Prefix { field: String, text: String },
}

impl Clause {
    pub fn exact(field: impl Into<String>, value: impl Into<String>) -> Self {
        Clause::Exact {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn flag(field: impl Into<String>, value: bool) -> Self {
        Clause::Flag {
            field: field.into(),
            value,
        }
    }
}

/// A facet the query asks the backend to count
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FacetField {
    pub field: String,
    /// Maximum values reported
    pub limit: usize,
    /// Values counted fewer times are dropped
    pub min_count: u64,
}

/// A not-yet-executed search request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Query {
    /// Model kinds searched; empty means every kind
    pub models: Vec<ModelKind>,

    /// Narrowing clauses, AND-combined in order
    pub clauses: Vec<Clause>,

    /// Sort directives, primary first
    pub sort: Vec<SortDirective>,

    /// Facets to count
    pub facets: Vec<FacetField>,

    /// Maximum results ever reported or materialized
    pub ceiling: usize,
}

impl Query {
    /// Create a base query over some model kinds
    pub fn new(models: Vec<ModelKind>, ceiling: usize) -> Self {
        Self {
            models,
            clauses: Vec::new(),
            sort: Vec::new(),
            facets: Vec::new(),
            ceiling,
        }
    }

    /// Add a narrowing clause
    pub fn narrow(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    /// Replace the sort directives
    pub fn with_sort(mut self, sort: Vec<SortDirective>) -> Self {
        self.sort = sort;
        self
    }

    /// Ask for counts on a facet field
    pub fn with_facet(mut self, facet: FacetField) -> Self {
        if !self.facets.iter().any(|f| f.field == facet.field) {
            self.facets.push(facet);
        }
        self
    }

    /// The directive the backend sorts by
    pub fn primary_sort(&self) -> SortDirective {
        self.sort.first().copied().unwrap_or_default()
    }
}

/// Query builder for translating a `Query` into a Tantivy query
pub struct QueryBuilder {
    schema: Schema,
    index: Index,
}

impl QueryBuilder {
    /// Create a new query builder
    pub fn new(schema: Schema, index: Index) -> Self {
        Self { schema, index }
    }

    /// Build a Tantivy query from a `Query`
    pub fn build(&self, query: &Query) -> SearchResult<Box<dyn TantivyQuery>> {
        let mut subqueries: Vec<(Occur, Box<dyn TantivyQuery>)> = Vec::new();

        if !query.models.is_empty() {
            let model_field = self.field(fields::MODEL)?;
            let kinds: Vec<(Occur, Box<dyn TantivyQuery>)> = query
                .models
                .iter()
                .map(|kind| {
                    let term = Term::from_field_text(model_field, &kind.to_string());
                    (Occur::Should, Self::term_query(term))
                })
                .collect();
            subqueries.push((Occur::Must, Box::new(BooleanQuery::new(kinds))));
        }

        for clause in &query.clauses {
            if let Some(built) = self.build_clause(clause)? {
                subqueries.push((Occur::Must, built));
            }
        }

        // Combine all queries
        if subqueries.is_empty() {
            Ok(Box::new(AllQuery))
        } else if subqueries.len() == 1 {
            Ok(subqueries.remove(0).1)
        } else {
            Ok(Box::new(BooleanQuery::new(subqueries)))
        }
    }

    /// `None` when the clause has nothing to match on and narrows nothing
    fn build_clause(&self, clause: &Clause) -> SearchResult<Option<Box<dyn TantivyQuery>>> {
        match clause {
            Clause::Text { fields: targets, text } => {
                let mut alternatives: Vec<(Occur, Box<dyn TantivyQuery>)> = Vec::new();
                for name in targets {
                    let field = self.field(name)?;
                    if self.is_raw_text(field) {
                        let trimmed = text.trim();
                        if !trimmed.is_empty() {
                            let term = Term::from_field_text(field, trimmed);
                            alternatives.push((Occur::Should, Self::term_query(term)));
                        }
                        continue;
                    }

                    let tokens = self.tokenize(field, text)?;
                    if tokens.is_empty() {
                        continue;
                    }
                    let all_tokens: Vec<(Occur, Box<dyn TantivyQuery>)> = tokens
                        .iter()
                        .map(|token| {
                            let term = Term::from_field_text(field, token);
                            (Occur::Must, Self::term_query(term))
                        })
                        .collect();
                    alternatives.push((Occur::Should, Box::new(BooleanQuery::new(all_tokens))));
                }

                if alternatives.is_empty() {
                    // text with no matchable content matches nothing
                    Ok(Some(Box::new(EmptyQuery)))
                } else {
                    Ok(Some(Box::new(BooleanQuery::new(alternatives))))
                }
            }

            Clause::Exact { field: name, value } => {
                let field = self.field(name)?;
                let term = match self.schema.get_field_entry(field).field_type() {
                    FieldType::Facet(_) => {
                        Term::from_facet(field, &Facet::from_path([name.as_str(), value.as_str()]))
                    }
                    FieldType::Str(_) if self.is_raw_text(field) => Term::from_field_text(field, value),
                    _ => {
                        return Err(SearchError::SchemaError(format!(
                            "field '{}' does not support exact matching",
                            name
                        )))
                    }
                };
                Ok(Some(Self::term_query(term)))
            }

            Clause::Flag { field: name, value } => {
                let field = self.field(name)?;
                Ok(Some(Self::term_query(Term::from_field_bool(field, *value))))
            }

            Clause::Prefix { field: name, text } => {
                let field = self.field(name)?;
                let tokens = self.tokenize(field, text)?;
                if tokens.is_empty() {
                    return Ok(None);
                }
                let mut prefixes: Vec<(Occur, Box<dyn TantivyQuery>)> = Vec::new();
                for token in tokens {
                    let pattern = format!("{}.*", regex::escape(&token));
                    let regex = RegexQuery::from_pattern(&pattern, field)
                        .map_err(|e| SearchError::QueryParsingFailed(e.to_string()))?;
                    prefixes.push((Occur::Must, Box::new(regex)));
                }
                Ok(Some(Box::new(BooleanQuery::new(prefixes))))
            }
        }
    }

    fn term_query(term: Term) -> Box<dyn TantivyQuery> {
        Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs))
    }

    fn field(&self, name: &str) -> SearchResult<Field> {
        self.schema
            .get_field(name)
            .map_err(|_| SearchError::SchemaError(format!("unknown field '{}'", name)))
    }

    /// Untokenized string field (`STRING`)
    fn is_raw_text(&self, field: Field) -> bool {
        match self.schema.get_field_entry(field).field_type() {
            FieldType::Str(options) => options
                .get_indexing_options()
                .map(|indexing| indexing.tokenizer() == "raw")
                .unwrap_or(false),
            _ => false,
        }
    }

    /// Run text through the field's analyzer
    fn tokenize(&self, field: Field, text: &str) -> SearchResult<Vec<String>> {
        let mut analyzer = self.index.tokenizer_for_field(field)?;
        let mut stream = analyzer.token_stream(text);
        let mut tokens = Vec::new();
        while stream.advance() {
            tokens.push(stream.token().text.clone());
        }
        Ok(tokens)
    }
}
