//! Filter pipelines: request parameters to narrowing clauses
//!
//! A pipeline is an ordered list of independent stages. Each stage reads only
//! the request parameters and the query accumulated so far, and is a no-op when
//! its parameter is absent or unusable.

use crate::search::document::fields;
use crate::search::query::{Clause, FacetField, Query, SortDirective, SortField};

/// Query-string parameters of one request, in arrival order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    pairs: Vec<(String, String)>,
}

impl RequestParams {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// Last value supplied for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value supplied for `key`, in order
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl From<Vec<(String, String)>> for RequestParams {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self::new(pairs)
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for RequestParams {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

/// Tri-state status parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusValue {
    Any,
    True,
    False,
}

impl StatusValue {
    /// Case-insensitive; anything else is unrecognised
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "any" => Some(StatusValue::Any),
            "true" => Some(StatusValue::True),
            "false" => Some(StatusValue::False),
            _ => None,
        }
    }
}

/// One status flag a view filters on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusDimension {
    pub param: &'static str,
    pub field: &'static str,
    pub default: StatusValue,
}

impl StatusDimension {
    pub const fn new(param: &'static str, field: &'static str, default: StatusValue) -> Self {
        Self {
            param,
            field,
            default,
        }
    }
}

/// A single pipeline stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterStage {
    /// `name`: full text on names, or the exact topic source id
    Name,

    /// `category`: repeatable `type::value` pairs
    Category,

    /// Verbatim equality for each listed parameter, which doubles as the field name
    Exact { params: Vec<&'static str> },

    /// Tri-state status flags
    Status { dimensions: Vec<StatusDimension> },

    /// `q`: token prefixes against the autocomplete field
    Autocomplete,

    /// `ordering`: comma separated, `-` for descending, restricted to `allowed`
    Ordering {
        allowed: Vec<SortField>,
        default: SortDirective,
    },

    /// Declare facet fields to count
    Facets {
        fields: Vec<&'static str>,
        limit: usize,
        min_count: u64,
    },
}

impl FilterStage {
    /// Apply this stage to the accumulated query
    pub fn apply(&self, query: Query, params: &RequestParams) -> Query {
        match self {
            FilterStage::Name => match params.get("name").map(str::trim) {
                Some(term) if !term.is_empty() => query.narrow(Clause::Text {
                    fields: vec![fields::NAME.to_string(), fields::TOPIC_SOURCE_ID.to_string()],
                    text: term.to_string(),
                }),
                _ => query,
            },

            FilterStage::Category => params
                .get_all("category")
                .into_iter()
                .filter_map(parse_category)
                .fold(query, |query, category| {
                    query.narrow(Clause::exact(fields::CATEGORY, category))
                }),

            FilterStage::Exact { params: names } => {
                names.iter().fold(query, |query, name| {
                    params
                        .get_all(name)
                        .into_iter()
                        .filter(|value| !value.trim().is_empty())
                        .fold(query, |query, value| query.narrow(Clause::exact(*name, value)))
                })
            }

            FilterStage::Status { dimensions } => dimensions.iter().fold(query, |query, dimension| {
                let value = params
                    .get(dimension.param)
                    .and_then(StatusValue::parse)
                    .unwrap_or(dimension.default);
                match value {
                    StatusValue::Any => query,
                    StatusValue::True => query.narrow(Clause::flag(dimension.field, true)),
                    StatusValue::False => query.narrow(Clause::flag(dimension.field, false)),
                }
            }),

            FilterStage::Autocomplete => match params.get("q").map(str::trim) {
                Some(term) if !term.is_empty() => query.narrow(Clause::Prefix {
                    field: fields::AUTOCOMPLETE.to_string(),
                    text: term.to_lowercase(),
                }),
                _ => query,
            },

            FilterStage::Ordering { allowed, default } => {
                let directives: Vec<SortDirective> = params
                    .get("ordering")
                    .map(|raw| {
                        raw.split(',')
                            .filter_map(SortDirective::parse)
                            .filter(|directive| allowed.contains(&directive.field))
                            .collect()
                    })
                    .unwrap_or_default();

                if directives.is_empty() {
                    query.with_sort(vec![*default])
                } else {
                    query.with_sort(directives)
                }
            }

            FilterStage::Facets {
                fields: facet_fields,
                limit,
                min_count,
            } => facet_fields.iter().fold(query, |query, field| {
                query.with_facet(FacetField {
                    field: field.to_string(),
                    limit: *limit,
                    min_count: *min_count,
                })
            }),
        }
    }
}

/// `type::value` with both halves trimmed and non-empty
pub(crate) fn parse_category(raw: &str) -> Option<String> {
    let (category_type, value) = raw.split_once("::")?;
    let (category_type, value) = (category_type.trim(), value.trim());
    if category_type.is_empty() || value.is_empty() {
        return None;
    }
    Some(format!("{}::{}", category_type, value))
}

/// Ordered filter stages run against a base query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<FilterStage>,
}

impl Pipeline {
    pub fn new(stages: Vec<FilterStage>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    /// Run every stage in declared order
    pub fn apply(&self, query: Query, params: &RequestParams) -> Query {
        self.stages
            .iter()
            .fold(query, |query, stage| stage.apply(query, params))
    }
}
