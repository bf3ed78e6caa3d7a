use crate::validation::{validate_key, validate_value};
use cuco_core::{Error, Result};
use serde::Serialize;

/// Ordered list of ticket fields.
///
/// Insertion order is the order fields are rendered and signed in, so the
/// record is a list of pairs rather than a map. Keys are unique, and a
/// resolved field with no value is left out instead of being stored empty.
///
/// Serializes as an array of `[key, value]` pairs.
///
/// # Example
/// ```
/// use cuco_ticket::FieldRecord;
///
/// let mut record = FieldRecord::new();
/// record.insert("V", "1").unwrap();
/// record.insert("TT", "F").unwrap();
/// record.insert_resolved("IT", None).unwrap();
///
/// assert_eq!(record.keys().collect::<Vec<_>>(), vec!["V", "TT"]);
/// assert!(record.insert("V", "2").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldRecord {
    entries: Vec<(String, String)>,
}

impl FieldRecord {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        FieldRecord {
            entries: Vec::new(),
        }
    }

    /// Append a field.
    ///
    /// # Errors
    /// - `Error::InvalidFieldFormat` if the key or value fails validation
    /// - `Error::DuplicateField` if the key is already present
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let key = key.into();
        let value = value.into();
        validate_key(&key)?;
        validate_value(&value)?;

        if self.contains_key(&key) {
            return Err(Error::DuplicateField(key));
        }

        self.entries.push((key, value));
        Ok(())
    }

    /// Append a field only if it resolved to a non-empty value.
    ///
    /// Returns whether the field was inserted.
    ///
    /// # Errors
    /// Same as [`FieldRecord::insert`].
    pub fn insert_resolved(&mut self, key: &str, value: Option<&str>) -> Result<bool> {
        match value {
            Some(value) if !value.is_empty() => {
                self.insert(key, value)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Get a field value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Get a field value or fail with `Error::MalformedTicket`.
    ///
    /// # Errors
    /// Returns `Error::MalformedTicket` if the key is absent.
    pub fn required(&self, key: &str) -> Result<&str> {
        self.get(key).ok_or_else(|| Error::MalformedTicket {
            message: format!("missing field {key}"),
        })
    }

    /// Whether the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}
