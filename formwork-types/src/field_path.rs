use std::fmt;

use serde::{Deserialize, Serialize};

/// A path to a value in the form's value tree, e.g. `"address.street"`.
///
/// Paths are hierarchical and use dot notation. Positional segments address
/// entries of a list, so the second entry of a dynamic array named
/// `contacts` lives under `contacts.1`. Bracket notation (`contacts[1].key`)
/// is accepted on construction and normalized to dots.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FieldPath {
    /// Normalized dot-separated path string.
    path: String,
}

impl FieldPath {
    /// Create a new path from a dot- or bracket-addressed string.
    pub fn new(path: impl Into<String>) -> Self {
        let raw = path.into();
        let clean = raw.is_empty() || raw.split('.').all(|s| !s.is_empty());
        if clean && !raw.contains(['[', ']']) {
            return Self { path: raw };
        }
        let path = raw
            .replace('[', ".")
            .replace(']', "")
            .split('.')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(".");
        Self { path }
    }

    /// Create an empty path (the root of the value tree).
    pub fn empty() -> Self {
        Self {
            path: String::new(),
        }
    }

    /// Append a child segment to this path, returning a new path.
    pub fn child(&self, name: &str) -> Self {
        if name.is_empty() {
            self.clone()
        } else if self.path.is_empty() {
            Self::new(name)
        } else {
            Self::new(format!("{}.{}", self.path, name))
        }
    }

    /// Append a positional segment, e.g. `contacts` -> `contacts.2`.
    pub fn index(&self, index: usize) -> Self {
        self.child(&index.to_string())
    }

    /// Get the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Check if the path is empty.
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Get the segments of this path as an iterator.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('.').filter(|s| !s.is_empty())
    }

    /// Get the number of segments in this path.
    pub fn len(&self) -> usize {
        self.segments().count()
    }

    /// Returns a new path with the given prefix removed, if it matches.
    pub fn strip_prefix(&self, prefix: &FieldPath) -> Option<Self> {
        if prefix.is_empty() {
            Some(self.clone())
        } else if self.path == prefix.path {
            Some(Self::empty())
        } else if self.starts_with(prefix) {
            Some(Self::new(&self.path[prefix.path.len() + 1..]))
        } else {
            None
        }
    }

    /// Whether `prefix` is this path or one of its ancestors.
    ///
    /// Matching is segment-wise: `items.1` is not a prefix of `items.10`.
    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        prefix.is_empty()
            || self.path == prefix.path
            || (self.path.starts_with(&prefix.path)
                && self.path[prefix.path.len()..].starts_with('.'))
    }

    /// Get the first segment, if any.
    pub fn first(&self) -> Option<&str> {
        self.segments().next()
    }

    /// Get the last segment, if any.
    pub fn last(&self) -> Option<&str> {
        self.path.rsplit('.').next().filter(|s| !s.is_empty())
    }

    /// Get the parent path by removing the last segment.
    /// Returns an empty path if this path has only one segment.
    pub fn parent(&self) -> Self {
        if let Some(last_dot) = self.path.rfind('.') {
            Self::new(&self.path[..last_dot])
        } else {
            Self::empty()
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

impl From<&str> for FieldPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for FieldPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&String> for FieldPath {
    fn from(s: &String) -> Self {
        Self::new(s.clone())
    }
}

impl From<&FieldPath> for FieldPath {
    fn from(p: &FieldPath) -> Self {
        p.clone()
    }
}

impl From<FieldPath> for String {
    fn from(p: FieldPath) -> Self {
        p.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new() {
        let path = FieldPath::new("name");
        assert_eq!(path.as_str(), "name");
    }

    #[test]
    fn bracket_notation_is_normalized() {
        let path = FieldPath::new("contacts[2].key");
        assert_eq!(path.as_str(), "contacts.2.key");
        assert_eq!(FieldPath::new("a[0][1]").as_str(), "a.0.1");
    }

    #[test]
    fn child_and_index() {
        let path = FieldPath::new("contacts").index(3).child("value");
        assert_eq!(path.as_str(), "contacts.3.value");
    }

    #[test]
    fn child_from_empty() {
        let path = FieldPath::empty().child("name");
        assert_eq!(path.as_str(), "name");
    }

    #[test]
    fn strip_prefix() {
        let path = FieldPath::new("address.street");
        let stripped = path.strip_prefix(&"address".into()).unwrap();
        assert_eq!(stripped.as_str(), "street");

        assert!(path.strip_prefix(&"other".into()).is_none());
        assert!(path.strip_prefix(&"addr".into()).is_none());
    }

    #[test]
    fn starts_with_is_segment_wise() {
        let path = FieldPath::new("items.10.name");
        assert!(path.starts_with(&"items".into()));
        assert!(path.starts_with(&"items.10".into()));
        assert!(!path.starts_with(&"items.1".into()));
    }

    #[test]
    fn segments_and_parent() {
        let path = FieldPath::new("address.location.city");
        let segments: Vec<_> = path.segments().collect();
        assert_eq!(segments, vec!["address", "location", "city"]);
        assert_eq!(path.parent().as_str(), "address.location");
        assert_eq!(path.last(), Some("city"));
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn serde_uses_plain_string() {
        let path: FieldPath = serde_json::from_str("\"rows[1].key\"").unwrap();
        assert_eq!(path.as_str(), "rows.1.key");
        assert_eq!(serde_json::to_string(&path).unwrap(), "\"rows.1.key\"");
    }
}
