//! Original Webhook Headers
//!
//! The API reports the headers of a received webhook as a JSON object whose
//! values are either a single string or a list of strings. They are normalized
//! here, once, into an ordered multimap. Header names keep their exact case
//! and wire order; values are never trimmed or re-encoded.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Ordered header multimap: name -> values, in the order the API reported them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMultimap {
    entries: Vec<(String, Vec<String>)>,
}

impl HeaderMultimap {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a value, keeping any values already recorded under `name`.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((name, vec![value])),
        }
    }

    /// Values recorded under `name` (exact-case match).
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    /// Case-insensitive presence check, as HTTP header names are.
    pub fn contains(&self, name: &str) -> bool {
        self.entries
            .iter()
            .any(|(n, values)| n.eq_ignore_ascii_case(name) && !values.is_empty())
    }

    /// Iterate header names with all of their values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Iterate every individual name/value pair, preserving multiplicity.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().flat_map(|(name, values)| {
            values
                .iter()
                .map(move |value| (name.as_str(), value.as_str()))
        })
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Normalize the JSON representation used by the API.
    ///
    /// - string: one value
    /// - array: one value per element; non-string elements are stringified
    /// - null: the header is dropped (it carries no value)
    /// - anything else: stringified into a single value
    ///
    /// A non-object document yields an empty multimap.
    pub fn from_json(value: &Value) -> Self {
        let mut headers = Self::new();
        let Value::Object(map) = value else {
            return headers;
        };

        for (name, raw) in map {
            match raw {
                Value::String(s) => headers.append(name.as_str(), s.as_str()),
                Value::Array(items) => {
                    for item in items {
                        headers.append(name.as_str(), stringify(item));
                    }
                }
                Value::Null => {}
                other => headers.append(name.as_str(), other.to_string()),
            }
        }
        headers
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl<'de> Deserialize<'de> for HeaderMultimap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_json(&value))
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for HeaderMultimap {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.append(name, value);
        }
        headers
    }
}
