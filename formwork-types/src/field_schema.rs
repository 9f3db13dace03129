use serde::{Deserialize, Serialize};

use crate::FieldPath;

/// Static descriptor of one form field.
///
/// Schemas are plain data: they are built in code with the `with_*`
/// builders or loaded from a JSON document, and never change while a form
/// is rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    /// Path of the field's value in the form value tree.
    pub name: FieldPath,

    /// Human readable label; falls back to `name` when empty.
    #[serde(default)]
    pub label: String,

    /// Which control renders the field.
    #[serde(alias = "type")]
    pub kind: FieldKind,

    #[serde(default)]
    pub required: bool,

    /// Choices for select, multi-select and radio fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ChoiceOption>,

    /// Accept specifier for file fields, e.g. `"image/*"` or `".pdf,application/pdf"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept: Option<String>,

    /// Allow several files, or several options for a select.
    #[serde(default)]
    pub multiple: bool,

    /// Coerce number inputs to numeric values.
    #[serde(default)]
    pub value_as_number: bool,

    #[serde(default)]
    pub disabled: bool,

    #[serde(default)]
    pub read_only: bool,

    /// Layout hint passed through to the control.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    /// Additional validation rules checked after `required`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Rule>,

    /// Sub-schema repeated by an `array` field.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldSchema>,
}

impl FieldSchema {
    /// Create a new schema with no label, options or rules.
    pub fn new(name: impl Into<FieldPath>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: String::new(),
            kind,
            required: false,
            options: Vec::new(),
            accept: None,
            multiple: false,
            value_as_number: false,
            disabled: false,
            read_only: false,
            class_name: None,
            placeholder: None,
            rules: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Create a dynamic array field repeating the given sub-schema.
    pub fn array(name: impl Into<FieldPath>, fields: Vec<FieldSchema>) -> Self {
        Self::new(name, FieldKind::Array).with_fields(fields)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_options(mut self, options: Vec<ChoiceOption>) -> Self {
        self.options = options;
        self
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    pub fn value_as_number(mut self) -> Self {
        self.value_as_number = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_fields(mut self, fields: Vec<FieldSchema>) -> Self {
        self.fields = fields;
        self
    }

    /// The label used in messages and next to the control.
    pub fn display_label(&self) -> &str {
        if self.label.trim().is_empty() {
            self.name.as_str()
        } else {
            &self.label
        }
    }

    /// Whether a select field picks several options.
    pub fn is_multi_select(&self) -> bool {
        self.kind == FieldKind::MultiSelect || (self.kind == FieldKind::Select && self.multiple)
    }

    /// Index of the option carrying `value`, if any.
    pub fn option_index(&self, value: &str) -> Option<usize> {
        self.options.iter().position(|o| o.value == value)
    }
}

/// The closed set of field kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    Text,
    Email,
    Number,
    Date,
    Textarea,
    Select,
    #[serde(alias = "multiselect")]
    MultiSelect,
    Checkbox,
    Radio,
    File,
    Password,
    /// Repeated group of sub-fields (also accepted as `composite`).
    #[serde(alias = "composite")]
    Array,
}

impl FieldKind {
    /// Kinds whose native signal is a raw input string.
    pub fn is_text_like(&self) -> bool {
        matches!(
            self,
            Self::Text | Self::Email | Self::Number | Self::Date | Self::Textarea | Self::Password
        )
    }

    /// Kinds that choose among `options`.
    pub fn is_choice(&self) -> bool {
        matches!(self, Self::Select | Self::MultiSelect | Self::Radio)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Number => "number",
            Self::Date => "date",
            Self::Textarea => "textarea",
            Self::Select => "select",
            Self::MultiSelect => "multi-select",
            Self::Checkbox => "checkbox",
            Self::Radio => "radio",
            Self::File => "file",
            Self::Password => "password",
            Self::Array => "array",
        }
    }
}

/// One choice of a select or radio field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub value: String,

    #[serde(default)]
    pub label: String,
}

impl ChoiceOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// The label shown for this option; falls back to the value.
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.value
        } else {
            &self.label
        }
    }
}

impl From<&str> for ChoiceOption {
    fn from(value: &str) -> Self {
        Self::new(value, value)
    }
}

/// Extra validation rule attached to a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Rule {
    /// Minimum number of characters (trimmed).
    MinLength(usize),
    /// Maximum number of characters (trimmed).
    MaxLength(usize),
    /// Minimum numeric value.
    Min(f64),
    /// Maximum numeric value.
    Max(f64),
    Email,
    StrongPassword,
    /// Value must be one of the listed strings.
    OneOf(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder() {
        let schema = FieldSchema::new("logo", FieldKind::File)
            .with_label("Logo")
            .with_accept("image/*")
            .multiple()
            .required();

        assert_eq!(schema.name.as_str(), "logo");
        assert_eq!(schema.display_label(), "Logo");
        assert_eq!(schema.accept.as_deref(), Some("image/*"));
        assert!(schema.multiple && schema.required);
    }

    #[test]
    fn label_falls_back_to_name() {
        let schema = FieldSchema::new("x", FieldKind::Text);
        assert_eq!(schema.display_label(), "x");
    }

    #[test]
    fn multi_select_detection() {
        assert!(FieldSchema::new("a", FieldKind::MultiSelect).is_multi_select());
        assert!(FieldSchema::new("a", FieldKind::Select).multiple().is_multi_select());
        assert!(!FieldSchema::new("a", FieldKind::Select).is_multi_select());
    }

    #[test]
    fn deserialize_from_json() {
        let json = r#"{
            "name": "price",
            "label": "Price",
            "kind": "number",
            "required": true,
            "valueAsNumber": true,
            "readOnly": true,
            "className": "col-6",
            "rules": [{ "min": 0 }]
        }"#;
        let schema: FieldSchema = serde_json::from_str(json).unwrap();
        assert_eq!(schema.kind, FieldKind::Number);
        assert!(schema.value_as_number && schema.read_only && schema.required);
        assert_eq!(schema.class_name.as_deref(), Some("col-6"));
        assert_eq!(schema.rules, vec![Rule::Min(0.0)]);
    }

    #[test]
    fn kind_aliases() {
        let kind: FieldKind = serde_json::from_str("\"multiselect\"").unwrap();
        assert_eq!(kind, FieldKind::MultiSelect);
        let kind: FieldKind = serde_json::from_str("\"composite\"").unwrap();
        assert_eq!(kind, FieldKind::Array);
    }
}
