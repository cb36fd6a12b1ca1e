//! Field-level validation: accumulate every violation, then accept or reject.
//!
//! A candidate record is never partially validated. Every rule in a [`RuleSet`]
//! runs, each failure is recorded against its field in [`FieldErrors`], and only
//! then is the candidate either accepted or rejected with the complete map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message carried by every [`ValidationError`].
pub const VALIDATION_FAILED: &str = "data does not pass validation";

/// Accumulated field → message violations for one candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation. A later message for the same field replaces the earlier one.
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Accept `value` when no violation was recorded, otherwise reject with all of them.
    pub fn into_result<T>(self, value: T) -> Validated<T> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(ValidationError { errors: self })
        }
    }
}

impl<K, V> FromIterator<(K, V)> for FieldErrors
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Rejection of a candidate record, carrying every violated field.
///
/// Only [`FieldErrors::into_result`] builds one, so the map is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("data does not pass validation: {}", summarize(.errors))]
pub struct ValidationError {
    errors: FieldErrors,
}

impl ValidationError {
    /// Reject with a single field violation.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field, message);
        Self { errors }
    }

    pub fn message(&self) -> &'static str {
        VALIDATION_FAILED
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn into_errors(self) -> FieldErrors {
        self.errors
    }
}

fn summarize(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Outcome of validating a candidate: the accepted value or the full violation map.
pub type Validated<T> = Result<T, ValidationError>;

/// A single field check. Returns the violation message, if any.
pub type FieldCheck<T> = fn(&T) -> Option<String>;

/// Ordered set of per-field checks for one record type.
pub struct RuleSet<T> {
    rules: Vec<(&'static str, FieldCheck<T>)>,
}

impl<T> RuleSet<T> {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a check for `field`. Checks run in insertion order.
    pub fn rule(mut self, field: &'static str, check: FieldCheck<T>) -> Self {
        self.rules.push((field, check));
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|(field, _)| *field)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every check against `candidate`, recording failures into `errors`.
    pub fn evaluate_into(&self, candidate: &T, errors: &mut FieldErrors) {
        for (field, check) in &self.rules {
            if let Some(message) = check(candidate) {
                errors.insert(*field, message);
            }
        }
    }

    pub fn evaluate(&self, candidate: &T) -> FieldErrors {
        let mut errors = FieldErrors::new();
        self.evaluate_into(candidate, &mut errors);
        errors
    }
}

impl<T> Default for RuleSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> core::fmt::Debug for RuleSet<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.fields()).finish()
    }
}

pub fn required_message(field: &str) -> String {
    format!("{field} is required")
}

/// Presence check for a string field; the empty string counts as missing.
pub fn required(field: &str, value: &str) -> Option<String> {
    value.is_empty().then(|| required_message(field))
}
