//! Loosely-typed price input and its parsing rules.

use serde::{Deserialize, Serialize};
use serde_json::Number;
use thiserror::Error;

use atelier_core::required_message;

/// A price as supplied by the caller: a JSON number or text.
///
/// Text is parsed leniently, the way form input usually arrives: leading
/// whitespace and an optional sign, then the leading run of digits
/// (`"12abc"` reads as 12). Fractional numbers truncate toward zero and
/// out-of-range magnitudes saturate, for numbers and text alike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceValue {
    Integer(i64),
    /// Any JSON number that does not fit `i64` exactly.
    Number(Number),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("price is empty")]
    Empty,
    #[error("price is not a number")]
    NotANumber,
}

impl PriceValue {
    pub fn is_blank(&self) -> bool {
        matches!(self, PriceValue::Text(text) if text.is_empty())
    }

    pub fn parse(&self) -> Result<i64, PriceError> {
        match self {
            PriceValue::Integer(n) => Ok(*n),
            PriceValue::Number(n) => Ok(truncate_number(n)),
            PriceValue::Text(text) => parse_leading_integer(text),
        }
    }
}

impl From<i64> for PriceValue {
    fn from(value: i64) -> Self {
        PriceValue::Integer(value)
    }
}

impl From<&str> for PriceValue {
    fn from(value: &str) -> Self {
        PriceValue::Text(value.to_string())
    }
}

fn parse_leading_integer(text: &str) -> Result<i64, PriceError> {
    if text.is_empty() {
        return Err(PriceError::Empty);
    }

    let trimmed = text.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..digits_end];
    if digits.is_empty() {
        return Err(PriceError::NotANumber);
    }

    // `digits` is all ASCII digits, so parsing can only fail on overflow.
    Ok(match (negative, digits.parse::<i64>()) {
        (false, Ok(magnitude)) => magnitude,
        (true, Ok(magnitude)) => -magnitude,
        (false, Err(_)) => i64::MAX,
        (true, Err(_)) => i64::MIN,
    })
}

fn truncate_number(n: &Number) -> i64 {
    if let Some(n) = n.as_i64() {
        return n;
    }
    if n.as_u64().is_some() {
        return i64::MAX;
    }
    // Float to int casts truncate toward zero and saturate.
    n.as_f64().map_or(0, |f| f as i64)
}

/// Rule for one required, non-negative price field.
pub fn check_price(field: &str, value: Option<&PriceValue>) -> Option<String> {
    let value = match value {
        Some(value) if !value.is_blank() => value,
        _ => return Some(required_message(field)),
    };

    match value.parse() {
        Ok(n) if n < 0 => Some(format!("{field} must be greater with 0")),
        Ok(_) => None,
        Err(_) => Some(format!("{field} must be a number")),
    }
}
