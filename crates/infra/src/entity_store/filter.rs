//! Document filter predicates.
//!
//! A small, backend-neutral predicate language over top-level document fields.
//! The in-memory store evaluates it directly; the Postgres store renders it to
//! SQL over a `jsonb` column.

use std::cmp::Ordering;

use regex::{Regex, RegexBuilder};
use serde_json::Value as JsonValue;

use atelier_core::{DELETED_FIELD, EntityId, ID_FIELD};

use super::r#trait::StoreError;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document.
    All,
    /// Field is present and equal to the value.
    Eq(String, JsonValue),
    /// Field is absent or not equal to the value.
    Ne(String, JsonValue),
    /// Field is a string matching the regular expression.
    Matches {
        field: String,
        pattern: String,
        case_insensitive: bool,
    },
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    pub fn ne(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Filter::Ne(field.into(), value.into())
    }

    pub fn id_eq(id: EntityId) -> Self {
        Filter::eq(ID_FIELD, id.to_string())
    }

    pub fn id_ne(id: EntityId) -> Self {
        Filter::ne(ID_FIELD, id.to_string())
    }

    pub fn not_deleted() -> Self {
        Filter::eq(DELETED_FIELD, false)
    }

    /// Case-insensitive literal substring match on `field`.
    pub fn contains_ignore_case(field: impl Into<String>, needle: &str) -> Self {
        Filter::Matches {
            field: field.into(),
            pattern: regex::escape(needle),
            case_insensitive: true,
        }
    }

    /// Free-text keyword over `code` or `name`.
    pub fn keyword(keyword: &str) -> Self {
        Filter::Or(vec![
            Filter::contains_ignore_case("code", keyword),
            Filter::contains_ignore_case("name", keyword),
        ])
    }

    /// Conjunction, flattening nested `And`s and dropping `All`.
    pub fn and(self, other: Filter) -> Self {
        let mut parts = Vec::new();
        for f in [self, other] {
            match f {
                Filter::All => {}
                Filter::And(inner) => parts.extend(inner),
                other => parts.push(other),
            }
        }
        match parts.len() {
            0 => Filter::All,
            1 => parts.remove(0),
            _ => Filter::And(parts),
        }
    }

    /// Pre-compile regular expressions for repeated evaluation.
    pub fn compile(&self) -> Result<CompiledFilter, StoreError> {
        Ok(match self {
            Filter::All => CompiledFilter::All,
            Filter::Eq(field, value) => CompiledFilter::Eq(field.clone(), value.clone()),
            Filter::Ne(field, value) => CompiledFilter::Ne(field.clone(), value.clone()),
            Filter::Matches {
                field,
                pattern,
                case_insensitive,
            } => {
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(*case_insensitive)
                    .build()
                    .map_err(|e| StoreError::InvalidQuery(format!("pattern `{pattern}`: {e}")))?;
                CompiledFilter::Matches(field.clone(), regex)
            }
            Filter::And(parts) => CompiledFilter::And(
                parts.iter().map(Filter::compile).collect::<Result<_, _>>()?,
            ),
            Filter::Or(parts) => CompiledFilter::Or(
                parts.iter().map(Filter::compile).collect::<Result<_, _>>()?,
            ),
        })
    }
}

/// A [`Filter`] ready to be evaluated against JSON documents.
#[derive(Debug, Clone)]
pub enum CompiledFilter {
    All,
    Eq(String, JsonValue),
    Ne(String, JsonValue),
    Matches(String, Regex),
    And(Vec<CompiledFilter>),
    Or(Vec<CompiledFilter>),
}

impl CompiledFilter {
    pub fn matches(&self, doc: &JsonValue) -> bool {
        match self {
            CompiledFilter::All => true,
            CompiledFilter::Eq(field, value) => doc.get(field) == Some(value),
            CompiledFilter::Ne(field, value) => doc.get(field) != Some(value),
            CompiledFilter::Matches(field, regex) => doc
                .get(field)
                .and_then(JsonValue::as_str)
                .is_some_and(|s| regex.is_match(s)),
            CompiledFilter::And(parts) => parts.iter().all(|f| f.matches(doc)),
            CompiledFilter::Or(parts) => parts.iter().any(|f| f.matches(doc)),
        }
    }
}

/// Total order over optional JSON values, used for sorting documents.
///
/// Missing < null < bool < number < string < array < object.
pub fn compare_json(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    fn rank(v: Option<&JsonValue>) -> u8 {
        match v {
            None => 0,
            Some(JsonValue::Null) => 1,
            Some(JsonValue::Bool(_)) => 2,
            Some(JsonValue::Number(_)) => 3,
            Some(JsonValue::String(_)) => 4,
            Some(JsonValue::Array(_)) => 5,
            Some(JsonValue::Object(_)) => 6,
        }
    }

    match (a, b) {
        (Some(JsonValue::Bool(x)), Some(JsonValue::Bool(y))) => x.cmp(y),
        (Some(JsonValue::Number(x)), Some(JsonValue::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(JsonValue::String(x)), Some(JsonValue::String(y))) => x.cmp(y),
        (Some(x @ JsonValue::Array(_)), Some(y @ JsonValue::Array(_)))
        | (Some(x @ JsonValue::Object(_)), Some(y @ JsonValue::Object(_))) => {
            x.to_string().cmp(&y.to_string())
        }
        _ => rank(a).cmp(&rank(b)),
    }
}
