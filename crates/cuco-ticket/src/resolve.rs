//! Attribute resolution for optional ticket fields.
//!
//! An optional field takes the device attribute if it is present and
//! non-empty, otherwise the process-wide default if that is present and
//! non-empty, otherwise it is left out of the ticket:
//!
//! ```
//! use cuco_ticket::{Defaults, DeviceAttributes, FieldResolver};
//!
//! let attributes = DeviceAttributes::from_json_str(r#"{"BT": "locked", "TW": ""}"#).unwrap();
//! let defaults = Defaults::from_json_str(r#"{"BT": "default", "TW": "02A300"}"#).unwrap();
//! let resolver = FieldResolver::new(&attributes, &defaults);
//!
//! assert_eq!(resolver.resolve("BT"), Some("locked"));
//! assert_eq!(resolver.resolve("TW"), Some("02A300"));
//! assert_eq!(resolver.resolve("IT"), None);
//! ```
//!
//! Attribute documents come from content-addressed storage in one of two
//! shapes, both accepted here:
//!
//! ```text
//! { "data": [["BT", "locked"], ["MaxUC", "64"]] }
//! { "BT": "locked", "MaxUC": 64 }
//! ```

use cuco_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Key of the pair-list shape of an attribute document.
const DATA_KEY: &str = "data";

/// Per-device attribute overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct DeviceAttributes(BTreeMap<String, String>);

/// Process-wide fallback values, loaded once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct Defaults(BTreeMap<String, String>);

macro_rules! attribute_map {
    ($name:ident) => {
        impl $name {
            /// Create an empty mapping.
            #[must_use]
            pub fn new() -> Self {
                $name(BTreeMap::new())
            }

            /// Parse a JSON document in either the pair-list or flat shape.
            ///
            /// # Errors
            /// Returns `Error::Json` for invalid JSON and
            /// `Error::InvalidAttributes` for documents of any other shape.
            pub fn from_json_str(json: &str) -> Result<Self> {
                let value: Value = serde_json::from_str(json)?;
                Self::from_json_value(&value)
            }

            /// Normalize an already-parsed JSON document.
            ///
            /// # Errors
            /// Returns `Error::InvalidAttributes` if the document is neither
            /// shape or holds a nested value.
            pub fn from_json_value(value: &Value) -> Result<Self> {
                normalize_document(value).map($name)
            }

            /// Value for `name`, if present (possibly empty).
            pub fn get(&self, name: &str) -> Option<&str> {
                self.0.get(name).map(String::as_str)
            }

            /// Insert or replace a value.
            pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
                self.0.insert(name.into(), value.into());
            }

            /// Number of entries.
            pub fn len(&self) -> usize {
                self.0.len()
            }

            /// Whether the mapping is empty.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            /// Entries ordered by name.
            pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
                self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
            }
        }

        impl TryFrom<Value> for $name {
            type Error = Error;

            fn try_from(value: Value) -> Result<Self> {
                Self::from_json_value(&value)
            }
        }

        impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for $name {
            fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
                $name(
                    iter.into_iter()
                        .map(|(k, v)| (k.into(), v.into()))
                        .collect(),
                )
            }
        }
    };
}

attribute_map!(DeviceAttributes);
attribute_map!(Defaults);

/// Resolves optional field values against attributes then defaults.
#[derive(Debug, Clone, Copy)]
pub struct FieldResolver<'a> {
    attributes: &'a DeviceAttributes,
    defaults: &'a Defaults,
}

impl<'a> FieldResolver<'a> {
    /// Resolver over one device's attributes, falling back to `defaults`.
    pub fn new(attributes: &'a DeviceAttributes, defaults: &'a Defaults) -> Self {
        FieldResolver {
            attributes,
            defaults,
        }
    }

    /// First non-empty value of `name` from attributes, then defaults.
    pub fn resolve(&self, name: &str) -> Option<&'a str> {
        non_empty(self.attributes.get(name)).or_else(|| non_empty(self.defaults.get(name)))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn normalize_document(value: &Value) -> Result<BTreeMap<String, String>> {
    let Value::Object(object) = value else {
        return Err(Error::InvalidAttributes {
            message: format!("expected a JSON object, got {}", json_kind(value)),
        });
    };

    let mut map = BTreeMap::new();

    if let Some(Value::Array(pairs)) = object.get(DATA_KEY) {
        // Entries that are not two-element arrays are ignored
        for pair in pairs {
            if let Value::Array(pair) = pair
                && let [key, value] = pair.as_slice()
            {
                let Some(key) = scalar_to_string(key)? else {
                    continue;
                };
                if let Some(value) = scalar_to_string(value)? {
                    map.insert(key, value);
                }
            }
        }
        return Ok(map);
    }

    for (key, value) in object {
        if let Some(value) = scalar_to_string(value)? {
            map.insert(key.clone(), value);
        }
    }
    Ok(map)
}

fn scalar_to_string(value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Array(_) | Value::Object(_) => Err(Error::InvalidAttributes {
            message: format!("nested {} values are not supported", json_kind(value)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
