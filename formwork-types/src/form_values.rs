use std::collections::BTreeMap;

use serde::Serialize;

use crate::{FieldPath, FieldValue};

/// One node of the form value tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FormNode {
    /// A leaf value.
    Value(FieldValue),

    /// Named children, e.g. a nested object or one dynamic-array entry.
    Group(BTreeMap<String, FormNode>),

    /// Positional children, e.g. the entries of a dynamic array.
    List(Vec<FormNode>),
}

impl FormNode {
    /// An empty group.
    pub fn group() -> Self {
        Self::Group(BTreeMap::new())
    }

    /// Get the leaf value, if this is a leaf.
    pub fn as_value(&self) -> Option<&FieldValue> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Get the children of a group.
    pub fn as_group(&self) -> Option<&BTreeMap<String, FormNode>> {
        match self {
            Self::Group(map) => Some(map),
            _ => None,
        }
    }

    /// Get the entries of a list.
    pub fn as_list(&self) -> Option<&[FormNode]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    fn child(&self, segment: &str) -> Option<&FormNode> {
        match self {
            Self::Group(map) => map.get(segment),
            Self::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            Self::Value(_) => None,
        }
    }

    fn child_mut(&mut self, segment: &str) -> Option<&mut FormNode> {
        match self {
            Self::Group(map) => map.get_mut(segment),
            Self::List(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(move |i| items.get_mut(i)),
            Self::Value(_) => None,
        }
    }

    /// Get or create the child at `segment`, turning leaves into containers
    /// as needed. Lists are padded with empty values up to the index.
    fn child_or_insert(&mut self, segment: &str, make: impl FnOnce() -> FormNode) -> &mut FormNode {
        let index = segment.parse::<usize>().ok();
        let wrong_shape = match self {
            Self::Value(_) => true,
            Self::List(_) => index.is_none(),
            Self::Group(_) => false,
        };
        if wrong_shape {
            *self = if index.is_some() {
                Self::List(Vec::new())
            } else {
                Self::group()
            };
        }

        match self {
            Self::Group(map) => map.entry(segment.to_string()).or_insert_with(make),
            Self::List(items) => {
                // `wrong_shape` guarantees a positional segment here.
                let i = index.unwrap_or(items.len());
                if i >= items.len() {
                    items.resize(i, FormNode::Value(FieldValue::Empty));
                    items.push(make());
                }
                &mut items[i]
            }
            Self::Value(_) => unreachable!("leaf replaced by a container above"),
        }
    }

    fn flatten_into<'a>(&'a self, prefix: &FieldPath, out: &mut Vec<(FieldPath, &'a FieldValue)>) {
        match self {
            Self::Value(v) => out.push((prefix.clone(), v)),
            Self::Group(map) => {
                for (key, node) in map {
                    node.flatten_into(&prefix.child(key), out);
                }
            }
            Self::List(items) => {
                for (i, node) in items.iter().enumerate() {
                    node.flatten_into(&prefix.index(i), out);
                }
            }
        }
    }
}

impl From<FieldValue> for FormNode {
    fn from(value: FieldValue) -> Self {
        Self::Value(value)
    }
}

impl From<serde_json::Value> for FormNode {
    /// Convert a server record into form values.
    ///
    /// Arrays of objects become lists (dynamic arrays); arrays of scalars
    /// become multi-select string lists.
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Self::Value(FieldValue::Empty),
            Json::Bool(b) => Self::Value(FieldValue::Bool(b)),
            Json::Number(n) => Self::Value(n.as_f64().map_or(FieldValue::Empty, FieldValue::Number)),
            Json::String(s) => Self::Value(FieldValue::String(s)),
            Json::Array(items) if items.iter().all(|i| i.is_object()) && !items.is_empty() => {
                Self::List(items.into_iter().map(FormNode::from).collect())
            }
            Json::Array(items) => Self::Value(FieldValue::Strings(
                items
                    .into_iter()
                    .map(|i| match i {
                        Json::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect(),
            )),
            Json::Object(map) => Self::Group(
                map.into_iter()
                    .map(|(k, v)| (k, FormNode::from(v)))
                    .collect(),
            ),
        }
    }
}

/// The form's value tree, addressed by [`FieldPath`].
///
/// Positional path segments address list entries, so `contacts.1.key`
/// is the `key` of the second entry of the `contacts` list. Removing a list
/// entry shifts every later entry down by one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FormValues {
    root: FormNode,
}

impl Default for FormValues {
    fn default() -> Self {
        Self::new()
    }
}

impl FormValues {
    /// Create an empty value tree.
    pub fn new() -> Self {
        Self {
            root: FormNode::group(),
        }
    }

    /// Build a value tree from a JSON object (e.g. a record loaded for editing).
    pub fn from_json(json: serde_json::Value) -> Self {
        match FormNode::from(json) {
            root @ FormNode::Group(_) => Self { root },
            _ => Self::new(),
        }
    }

    /// Get the node at `path`.
    pub fn get(&self, path: &FieldPath) -> Option<&FormNode> {
        path.segments()
            .try_fold(&self.root, |node, segment| node.child(segment))
    }

    /// Get a mutable reference to the node at `path`.
    pub fn get_mut(&mut self, path: &FieldPath) -> Option<&mut FormNode> {
        let mut node = &mut self.root;
        for segment in path.segments() {
            node = node.child_mut(segment)?;
        }
        Some(node)
    }

    /// Get the leaf value at `path`.
    pub fn value(&self, path: &FieldPath) -> Option<&FieldValue> {
        self.get(path).and_then(FormNode::as_value)
    }

    /// Get the leaf at `path` as a string, or `""`.
    pub fn string(&self, path: &FieldPath) -> &str {
        self.value(path).and_then(FieldValue::as_str).unwrap_or("")
    }

    /// Check if a node exists at `path`.
    pub fn contains(&self, path: &FieldPath) -> bool {
        self.get(path).is_some()
    }

    /// Store a leaf value at `path`, creating intermediate groups and lists.
    pub fn set(&mut self, path: impl Into<FieldPath>, value: impl Into<FieldValue>) {
        self.set_node(path, FormNode::Value(value.into()));
    }

    /// Store a node at `path`, creating intermediate groups and lists.
    pub fn set_node(&mut self, path: impl Into<FieldPath>, node: FormNode) {
        let path = path.into();
        if path.is_empty() {
            if matches!(node, FormNode::Group(_)) {
                self.root = node;
            }
            return;
        }
        let segments: Vec<&str> = path.segments().collect();
        let mut current = &mut self.root;
        for (i, segment) in segments.iter().enumerate() {
            let next_is_index = segments
                .get(i + 1)
                .is_some_and(|next| next.parse::<usize>().is_ok());
            current = current.child_or_insert(segment, || {
                if next_is_index {
                    FormNode::List(Vec::new())
                } else {
                    FormNode::group()
                }
            });
        }
        *current = node;
    }

    /// Remove the node at `path`. Removing a list entry shifts later entries.
    pub fn remove(&mut self, path: &FieldPath) -> Option<FormNode> {
        let last = path.last()?.to_string();
        match self.get_mut(&path.parent())? {
            FormNode::Group(map) => map.remove(&last),
            FormNode::List(items) => {
                let index = last.parse::<usize>().ok().filter(|i| *i < items.len())?;
                Some(items.remove(index))
            }
            FormNode::Value(_) => None,
        }
    }

    /// Get the entries of the list at `path`.
    pub fn list(&self, path: &FieldPath) -> Option<&[FormNode]> {
        self.get(path).and_then(FormNode::as_list)
    }

    /// Get the list at `path`, creating an empty one if nothing is stored
    /// there or the stored leaf is blank (`null` or `[]` in a loaded record).
    ///
    /// Returns `None` when any other node already occupies the path.
    pub fn list_mut(&mut self, path: &FieldPath) -> Option<&mut Vec<FormNode>> {
        let vacant = match self.get(path) {
            None => true,
            Some(FormNode::Value(FieldValue::Empty)) => true,
            Some(FormNode::Value(FieldValue::Strings(items))) => items.is_empty(),
            Some(_) => false,
        };
        if vacant {
            self.set_node(path.clone(), FormNode::List(Vec::new()));
        }
        match self.get_mut(path)? {
            FormNode::List(items) => Some(items),
            _ => None,
        }
    }

    /// All leaf values with their full paths, in tree order.
    pub fn flatten(&self) -> Vec<(FieldPath, &FieldValue)> {
        let mut out = Vec::new();
        self.root.flatten_into(&FieldPath::empty(), &mut out);
        out
    }

    /// The root node.
    pub fn root(&self) -> &FormNode {
        &self.root
    }

    /// Consume the tree, returning its root group.
    pub fn into_root(self) -> FormNode {
        self.root
    }

    /// Check if no values are stored.
    pub fn is_empty(&self) -> bool {
        matches!(&self.root, FormNode::Group(map) if map.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_nested() {
        let mut values = FormValues::new();
        values.set("name", "Alice");
        values.set("address.city", "Springfield");

        assert_eq!(values.string(&"name".into()), "Alice");
        assert_eq!(values.string(&"address.city".into()), "Springfield");
        assert!(values.get(&"address".into()).unwrap().as_group().is_some());
    }

    #[test]
    fn positional_segments_create_lists() {
        let mut values = FormValues::new();
        values.set("contacts.0.key", "phone");
        values.set("contacts[1].key", "email");

        let list = values.list(&"contacts".into()).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(values.string(&"contacts.1.key".into()), "email");
    }

    #[test]
    fn removing_list_entry_shifts_later_entries() {
        let mut values = FormValues::new();
        values.set("rows.0.key", "a");
        values.set("rows.1.key", "b");
        values.set("rows.2.key", "c");

        values.remove(&"rows.0".into());

        assert_eq!(values.list(&"rows".into()).unwrap().len(), 2);
        assert_eq!(values.string(&"rows.0.key".into()), "b");
        assert_eq!(values.string(&"rows.1.key".into()), "c");
        assert!(values.get(&"rows.2".into()).is_none());
    }

    #[test]
    fn list_mut_creates_missing_list() {
        let mut values = FormValues::new();
        values.list_mut(&"items".into()).unwrap().push(FormNode::group());
        assert_eq!(values.list(&"items".into()).unwrap().len(), 1);

        values.set("title", "x");
        assert!(values.list_mut(&"title".into()).is_none());
    }

    #[test]
    fn flatten_lists_leaves() {
        let mut values = FormValues::new();
        values.set("a", "1");
        values.set("b.0.c", "2");
        let paths: Vec<String> = values
            .flatten()
            .into_iter()
            .map(|(p, _)| p.to_string())
            .collect();
        assert_eq!(paths, vec!["a", "b.0.c"]);
    }

    #[test]
    fn from_json_record() {
        let values = FormValues::from_json(serde_json::json!({
            "name": "Acme",
            "active": true,
            "tags": ["a", "b"],
            "contacts": [{ "key": "phone", "value": "123" }],
        }));

        assert_eq!(values.string(&"name".into()), "Acme");
        assert_eq!(
            values.value(&"active".into()),
            Some(&FieldValue::Bool(true))
        );
        assert_eq!(
            values.value(&"tags".into()).and_then(FieldValue::as_strings),
            Some(&["a".to_string(), "b".to_string()][..])
        );
        assert_eq!(values.string(&"contacts.0.value".into()), "123");
    }

    #[test]
    fn blank_leaf_becomes_an_empty_list() {
        let mut values = FormValues::from_json(serde_json::json!({
            "contacts": [],
            "links": null,
            "tags": ["a"],
        }));

        assert_eq!(values.list_mut(&"contacts".into()).map(|l| l.len()), Some(0));
        assert_eq!(values.list_mut(&"links".into()).map(|l| l.len()), Some(0));
        assert!(values.list_mut(&"tags".into()).is_none());
        assert_eq!(values.list(&"contacts".into()).map(<[_]>::len), Some(0));
    }

    #[test]
    fn serializes_as_plain_tree() {
        let mut values = FormValues::new();
        values.set("rows.0.key", "k");
        values.set("count", 2.0);
        assert_eq!(
            serde_json::to_value(&values).unwrap(),
            serde_json::json!({ "count": 2.0, "rows": [{ "key": "k" }] })
        );
    }
}
