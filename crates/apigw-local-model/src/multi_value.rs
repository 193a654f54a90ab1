//! Ordered multi-value map for headers and query parameters.
//!
//! The proxy event carries headers and query parameters twice: once with every
//! value (`multiValue*`) and once with a single value per key. Only the
//! multi-value form is stored here; the single-value form is the
//! [`SingleValueProjection`], which always picks the last value of each key.
//! The two shapes therefore cannot drift apart.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Ordered mapping from key to an ordered, non-empty list of values.
///
/// Keys keep the casing of their first occurrence. Header maps compare keys
/// case-insensitively; query maps compare them exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiValueMap {
    entries: Vec<(String, Vec<String>)>,
    case_insensitive: bool,
}

impl MultiValueMap {
    /// Create an empty map with exact key comparison.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty map with ASCII case-insensitive key comparison.
    #[must_use]
    pub fn case_insensitive() -> Self {
        Self {
            entries: Vec::new(),
            case_insensitive: true,
        }
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| {
            if self.case_insensitive {
                k.eq_ignore_ascii_case(key)
            } else {
                k == key
            }
        })
    }

    /// Append a value, creating the key if needed.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        match self.position(&key) {
            Some(idx) => self.entries[idx].1.push(value.into()),
            None => self.entries.push((key, vec![value.into()])),
        }
    }

    /// Add `values` under `key` only if the key is not present yet.
    ///
    /// Returns `true` when the values were added. An empty `values` list is
    /// ignored.
    pub fn insert_if_absent(&mut self, key: impl Into<String>, values: Vec<String>) -> bool {
        let key = key.into();
        if values.is_empty() || self.position(&key).is_some() {
            return false;
        }
        self.entries.push((key, values));
        true
    }

    /// All values for `key`, in arrival order.
    #[must_use]
    pub fn get_all(&self, key: &str) -> Option<&[String]> {
        self.position(key).map(|idx| self.entries[idx].1.as_slice())
    }

    /// The last value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key)
            .and_then(<[String]>::last)
            .map(String::as_str)
    }

    /// Last-value-wins view of this map.
    #[must_use]
    pub fn single_value(&self) -> SingleValueProjection<'_> {
        SingleValueProjection(self)
    }
}

/// Serializes as `{"key": ["v1", "v2"], ...}` in insertion order.
impl Serialize for MultiValueMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, values) in &self.entries {
            map.serialize_entry(key, values)?;
        }
        map.end()
    }
}

/// Borrowed single-value view of a [`MultiValueMap`].
#[derive(Debug, Clone, Copy)]
pub struct SingleValueProjection<'a>(&'a MultiValueMap);

impl SingleValueProjection<'_> {
    /// Iterate over keys and their last value.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .entries
            .iter()
            .filter_map(|(k, v)| v.last().map(|last| (k.as_str(), last.as_str())))
    }
}

/// Serializes as `{"key": "last value", ...}` in insertion order.
impl Serialize for SingleValueProjection<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.entries.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
