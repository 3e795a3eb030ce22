//! Untyped record bags as published by upstream feeds.
//!
//! Feeds are spreadsheet exports: every row is a loose `field -> value` map whose
//! field names drift in casing and whose values arrive as numbers, strings, booleans
//! or nothing at all. `RawRecord` only exists at the boundary; the normalizer turns
//! it into strict types immediately.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One raw row from a feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value. Only objects are records; anything else yields `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Builder-style field insert (handy for fixtures).
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Look up a field by name, ignoring case and surrounding whitespace in the
    /// field name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        if let Some(v) = self.0.get(name) {
            return Some(v);
        }
        self.0
            .iter()
            .find(|(k, _)| k.trim().eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// First alias that carries usable text.
    pub fn text(&self, aliases: &[&str]) -> Option<String> {
        aliases
            .iter()
            .filter_map(|a| self.field(a))
            .find_map(coerce_text)
    }

    /// First alias that is present and non-null, coerced to a number.
    ///
    /// Missing or unparseable values become `0.0`.
    pub fn number(&self, aliases: &[&str]) -> f64 {
        aliases
            .iter()
            .filter_map(|a| self.field(a))
            .find(|v| !v.is_null())
            .map(coerce_number)
            .unwrap_or(0.0)
    }

    /// Like [`RawRecord::number`] but distinguishes "absent" from zero.
    pub fn optional_number(&self, aliases: &[&str]) -> Option<f64> {
        aliases
            .iter()
            .filter_map(|a| self.field(a))
            .find(|v| !v.is_null())
            .map(coerce_number)
    }
}

impl FromIterator<(String, Value)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Coerce a loose value to trimmed text. Empty strings and structured values yield
/// `None`.
pub fn coerce_text(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    if s.is_empty() { None } else { Some(s) }
}

/// Coerce a loose value to a finite `f64`; anything unparseable becomes `0.0`.
pub fn coerce_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        Value::Bool(false) | Value::Null | Value::Array(_) | Value::Object(_) => 0.0,
    };
    if n.is_finite() { n } else { 0.0 }
}
