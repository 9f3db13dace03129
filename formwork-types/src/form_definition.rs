use serde::{Deserialize, Serialize};

use crate::{FieldPath, FieldSchema, FormError};

/// The top-level list of field schemas that make up one screen.
///
/// A definition is presentation-agnostic: it can be rendered by any backend
/// and knows nothing about the entity it edits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormDefinition {
    /// Optional heading shown above the form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Optional text shown below the heading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// All fields, in display order.
    pub fields: Vec<FieldSchema>,
}

impl FormDefinition {
    /// Create a new definition with the given fields.
    pub fn new(fields: Vec<FieldSchema>) -> Self {
        Self {
            title: None,
            description: None,
            fields,
        }
    }

    /// Parse a definition from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, FormError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Get the fields.
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    /// Find a top-level field by name.
    pub fn field(&self, name: &FieldPath) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| &f.name == name)
    }

    /// Check if the definition has any fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Get the number of top-level fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldKind;

    #[test]
    fn from_json_document() {
        let definition = FormDefinition::from_json(
            r#"{
                "title": "Agency",
                "fields": [
                    { "name": "name", "label": "Name", "kind": "text", "required": true },
                    { "name": "logo", "label": "Logo", "kind": "file", "accept": "image/*" },
                    { "name": "contacts", "kind": "array", "fields": [
                        { "name": "key", "kind": "text", "required": true },
                        { "name": "value", "kind": "text" }
                    ] }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(definition.title.as_deref(), Some("Agency"));
        assert_eq!(definition.len(), 3);
        let contacts = definition.field(&"contacts".into()).unwrap();
        assert_eq!(contacts.kind, FieldKind::Array);
        assert_eq!(contacts.fields.len(), 2);
    }

    #[test]
    fn invalid_json_is_a_schema_error() {
        let err = FormDefinition::from_json("{ not json").unwrap_err();
        assert!(matches!(err, FormError::Schema(_)));
    }
}
