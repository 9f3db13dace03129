use serde::Serialize;

use crate::{FieldPath, FieldValue};

/// The one shape every field change is normalized into.
///
/// Downstream consumers (the value store, validation, submission) only ever
/// see this event, whatever control produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub name: FieldPath,

    pub value: FieldValue,

    /// New snapshot of the removed server paths; only file fields set this.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed_files: Option<Vec<String>>,
}

impl ChangeEvent {
    pub fn new(name: impl Into<FieldPath>, value: impl Into<FieldValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            removed_files: None,
        }
    }

    /// Attach a removed-files snapshot.
    pub fn with_removed_files(mut self, removed: Vec<String>) -> Self {
        self.removed_files = Some(removed);
        self
    }
}
