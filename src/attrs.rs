//! Attribute bags describing inputs.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::FetchError;

/// A single attribute value.
///
/// Serialized as the bare JSON scalar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Attr {
    /// String value.
    String(String),
    /// Unsigned integer value.
    Int(u64),
    /// Boolean value.
    Bool(bool),
}

impl Attr {
    fn kind(&self) -> &'static str {
        match self {
            Attr::String(_) => "a string",
            Attr::Int(_) => "an integer",
            Attr::Bool(_) => "a Boolean",
        }
    }
}

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attr::String(s) => f.write_str(s),
            Attr::Int(n) => write!(f, "{n}"),
            Attr::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Attr {
    fn from(s: &str) -> Self {
        Attr::String(s.to_string())
    }
}

impl From<String> for Attr {
    fn from(s: String) -> Self {
        Attr::String(s)
    }
}

impl From<u64> for Attr {
    fn from(n: u64) -> Self {
        Attr::Int(n)
    }
}

impl From<bool> for Attr {
    fn from(b: bool) -> Self {
        Attr::Bool(b)
    }
}

/// Sorted mapping from attribute name to [`Attr`].
///
/// The serialized form is a JSON object with keys in ascending order, which
/// is what [`to_json_string`](Self::to_json_string) produces and what
/// inputs are compared and displayed by.
///
/// ```rust
/// use inputfs::{Attr, Attrs};
///
/// let attrs: Attrs = [("type", Attr::from("path")), ("path", Attr::from("/src"))]
///     .into_iter()
///     .collect();
/// assert_eq!(attrs.to_json_string(), r#"{"path":"/src","type":"path"}"#);
/// assert_eq!(attrs.get_str("type").unwrap(), "path");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attrs(BTreeMap<String, Attr>);

impl Attrs {
    /// Empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name`, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Attr>) -> Option<Attr> {
        self.0.insert(name.into(), value.into())
    }

    /// Remove `name`, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<Attr> {
        self.0.remove(name)
    }

    /// Raw access to `name`.
    pub fn get(&self, name: &str) -> Option<&Attr> {
        self.0.get(name)
    }

    /// Whether `name` is set.
    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Attributes in ascending name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Attr> {
        self.0.iter()
    }

    /// `name` as a string, `None` if absent.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidAttribute`] if present with another type
    pub fn maybe_get_str(&self, name: &str) -> Result<Option<&str>, FetchError> {
        match self.0.get(name) {
            None => Ok(None),
            Some(Attr::String(s)) => Ok(Some(s)),
            Some(other) => Err(wrong_type(name, "a string", other)),
        }
    }

    /// `name` as a string.
    pub fn get_str(&self, name: &str) -> Result<&str, FetchError> {
        self.maybe_get_str(name)?.ok_or_else(|| missing(name))
    }

    /// `name` as an integer, `None` if absent.
    pub fn maybe_get_int(&self, name: &str) -> Result<Option<u64>, FetchError> {
        match self.0.get(name) {
            None => Ok(None),
            Some(Attr::Int(n)) => Ok(Some(*n)),
            Some(other) => Err(wrong_type(name, "an integer", other)),
        }
    }

    /// `name` as an integer.
    pub fn get_int(&self, name: &str) -> Result<u64, FetchError> {
        self.maybe_get_int(name)?.ok_or_else(|| missing(name))
    }

    /// `name` as a Boolean, `None` if absent.
    pub fn maybe_get_bool(&self, name: &str) -> Result<Option<bool>, FetchError> {
        match self.0.get(name) {
            None => Ok(None),
            Some(Attr::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(wrong_type(name, "a Boolean", other)),
        }
    }

    /// `name` as a Boolean.
    pub fn get_bool(&self, name: &str) -> Result<bool, FetchError> {
        self.maybe_get_bool(name)?.ok_or_else(|| missing(name))
    }

    /// Canonical JSON form: one object, keys sorted, no whitespace.
    pub fn to_json_string(&self) -> String {
        // Map keys are strings and values are scalars, so this cannot fail.
        serde_json::to_string(&self.0).unwrap_or_default()
    }

    /// Parse the JSON object form.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Deserialization`] if `json` is not an object of scalars
    pub fn from_json_str(json: &str) -> Result<Self, FetchError> {
        serde_json::from_str(json).map_err(|e| FetchError::Deserialization(e.to_string()))
    }
}

fn missing(name: &str) -> FetchError {
    FetchError::MissingAttribute {
        name: name.to_string(),
    }
}

fn wrong_type(name: &str, expected: &str, got: &Attr) -> FetchError {
    FetchError::InvalidAttribute {
        name: name.to_string(),
        details: format!("expected {expected}, got {}", got.kind()),
    }
}

impl fmt::Display for Attrs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json_string())
    }
}

impl From<BTreeMap<String, Attr>> for Attrs {
    fn from(map: BTreeMap<String, Attr>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>> FromIterator<(K, Attr)> for Attrs {
    fn from_iter<I: IntoIterator<Item = (K, Attr)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl IntoIterator for Attrs {
    type Item = (String, Attr);
    type IntoIter = btree_map::IntoIter<String, Attr>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Attrs {
    type Item = (&'a String, &'a Attr);
    type IntoIter = btree_map::Iter<'a, String, Attr>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Attrs {
        let mut attrs = Attrs::new();
        attrs.insert("type", "git");
        attrs.insert("revCount", 42u64);
        attrs.insert("shallow", true);
        attrs
    }

    #[test]
    fn canonical_json_is_sorted() {
        assert_eq!(
            sample().to_json_string(),
            r#"{"revCount":42,"shallow":true,"type":"git"}"#
        );
    }

    #[test]
    fn json_parses_each_scalar_kind() {
        let attrs = Attrs::from_json_str(r#"{"type":"git","shallow":true,"revCount":42}"#).unwrap();
        assert_eq!(attrs, sample());
    }

    #[test]
    fn json_rejects_nested_values() {
        assert!(matches!(
            Attrs::from_json_str(r#"{"a":[1]}"#),
            Err(FetchError::Deserialization(_))
        ));
        assert!(Attrs::from_json_str(r#"{"a":-1}"#).is_err());
    }

    #[test]
    fn typed_getters() {
        let attrs = sample();
        assert_eq!(attrs.get_str("type").unwrap(), "git");
        assert_eq!(attrs.get_int("revCount").unwrap(), 42);
        assert!(attrs.get_bool("shallow").unwrap());
        assert_eq!(attrs.maybe_get_str("ref").unwrap(), None);
    }

    #[test]
    fn typed_getter_errors() {
        let attrs = sample();
        assert!(matches!(
            attrs.get_str("ref"),
            Err(FetchError::MissingAttribute { ref name }) if name == "ref"
        ));
        assert!(matches!(
            attrs.get_str("revCount"),
            Err(FetchError::InvalidAttribute { ref name, .. }) if name == "revCount"
        ));
        assert!(attrs.maybe_get_int("type").is_err());
        assert!(attrs.maybe_get_bool("type").is_err());
    }

    #[test]
    fn insertion_order_is_irrelevant() {
        let mut a = Attrs::new();
        a.insert("b", "2");
        a.insert("a", "1");
        let b: Attrs = [("a", Attr::from("1")), ("b", Attr::from("2"))]
            .into_iter()
            .collect();
        assert_eq!(a, b);
        assert_eq!(a.to_json_string(), b.to_json_string());
    }
}
