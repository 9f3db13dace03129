//! Repeatable groups of sub-fields.

use formwork_types::{
    FieldKind, FieldPath, FieldSchema, FieldValue, FormError, FormNode, FormStore, FormValues,
    Notifier,
};

/// Message sent to the notifier when an add is refused.
pub const ADD_REFUSED_MESSAGE: &str =
    "Please fill in the required fields of the last entry before adding another one.";

/// Controller for one `array` field.
///
/// Entries live in the host store as a list at `name`; the sub-field `key`
/// of entry `i` is addressed as `name.i.key`. The controller keeps no state
/// of its own, so whether an entry can be added is always derived from the
/// current values.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicArray {
    name: FieldPath,
    fields: Vec<FieldSchema>,
    refused_message: String,
}

impl DynamicArray {
    /// Create a controller for an array at `name` repeating `fields`.
    pub fn new(name: impl Into<FieldPath>, fields: Vec<FieldSchema>) -> Self {
        Self {
            name: name.into(),
            fields,
            refused_message: ADD_REFUSED_MESSAGE.to_string(),
        }
    }

    /// Create a controller from an `array` schema.
    pub fn from_schema(schema: &FieldSchema) -> Result<Self, FormError> {
        if schema.kind != FieldKind::Array {
            return Err(FormError::NotAnArray(schema.name.clone()));
        }
        Ok(Self::new(schema.name.clone(), schema.fields.clone()))
    }

    /// Address the controller at a concrete path (for arrays nested in arrays).
    pub fn at(mut self, name: impl Into<FieldPath>) -> Self {
        self.name = name.into();
        self
    }

    /// Replace the message used when an add is refused.
    pub fn with_refused_message(mut self, message: impl Into<String>) -> Self {
        self.refused_message = message.into();
        self
    }

    pub fn name(&self) -> &FieldPath {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    /// Number of entries currently stored.
    pub fn len(&self, values: &FormValues) -> usize {
        values.list(&self.name).map_or(0, <[FormNode]>::len)
    }

    pub fn is_empty(&self, values: &FormValues) -> bool {
        self.len(values) == 0
    }

    /// Path of entry `index`.
    pub fn entry_path(&self, index: usize) -> FieldPath {
        self.name.index(index)
    }

    /// Path of sub-field `field` in entry `index`.
    pub fn field_path(&self, index: usize, field: &FieldSchema) -> FieldPath {
        self.entry_path(index).child(field.name.as_str())
    }

    /// Whether every required sub-field of entry `index` holds a non-blank value.
    pub fn is_entry_complete(&self, values: &FormValues, index: usize) -> bool {
        self.fields.iter().filter(|f| f.required).all(|field| {
            values
                .value(&self.field_path(index, field))
                .is_some_and(|v| !v.is_blank())
        })
    }

    /// Whether a new entry may be appended: the array is empty or its last
    /// entry is complete.
    pub fn can_add(&self, values: &FormValues) -> bool {
        match self.len(values) {
            0 => true,
            len => self.is_entry_complete(values, len - 1),
        }
    }

    /// Append an empty entry, unless the last entry is incomplete.
    ///
    /// A refused add leaves the array unchanged, sends one warning to
    /// `notifier` and returns `Ok(false)`.
    pub fn add(
        &self,
        store: &mut impl FormStore,
        notifier: &dyn Notifier,
    ) -> Result<bool, FormError> {
        if !self.can_add(store.values()) {
            tracing::warn!(field = %self.name, "refused to add an entry to an incomplete array");
            notifier.warn(&self.refused_message);
            return Ok(false);
        }

        let mut entry = FormValues::new();
        for field in &self.fields {
            entry.set(field.name.clone(), FieldValue::String(String::new()));
        }
        let list = store
            .values_mut()
            .list_mut(&self.name)
            .ok_or_else(|| FormError::NotAnArray(self.name.clone()))?;
        list.push(entry.into_root());

        tracing::debug!(field = %self.name, len = list.len(), "added array entry");
        Ok(true)
    }

    /// Remove entry `index`; later entries move down by one position.
    pub fn remove(&self, store: &mut impl FormStore, index: usize) -> Option<FormNode> {
        let removed = store.values_mut().remove(&self.entry_path(index));
        if removed.is_some() {
            tracing::debug!(field = %self.name, index, "removed array entry");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingNotifier;

    fn contacts() -> DynamicArray {
        DynamicArray::new(
            "contacts",
            vec![
                FieldSchema::new("key", FieldKind::Text).required(),
                FieldSchema::new("value", FieldKind::Text),
            ],
        )
    }

    #[test]
    fn add_to_empty_array_creates_blank_entry() {
        let array = contacts();
        let mut values = FormValues::new();
        let notifier = RecordingNotifier::new();

        assert!(array.add(&mut values, &notifier).unwrap());
        assert_eq!(array.len(&values), 1);
        assert_eq!(values.value(&"contacts.0.key".into()), Some(&FieldValue::from("")));
        assert_eq!(values.value(&"contacts.0.value".into()), Some(&FieldValue::from("")));
        assert!(notifier.messages().is_empty());
    }

    #[test]
    fn incomplete_last_entry_blocks_add() {
        let array = contacts();
        let mut values = FormValues::new();
        let notifier = RecordingNotifier::new();

        array.add(&mut values, &notifier).unwrap();
        assert!(!array.add(&mut values, &notifier).unwrap());
        assert_eq!(array.len(&values), 1);
        assert_eq!(notifier.messages(), vec![ADD_REFUSED_MESSAGE.to_string()]);

        values.set("contacts.0.key", "   ");
        assert!(!array.can_add(&values));

        values.set("contacts.0.key", "phone");
        assert!(array.can_add(&values));
        assert!(array.add(&mut values, &notifier).unwrap());
        assert_eq!(array.len(&values), 2);
    }

    #[test]
    fn remove_shifts_later_entries() {
        let array = contacts();
        let mut values = FormValues::new();
        values.set("contacts.0.key", "a");
        values.set("contacts.1.key", "b");
        values.set("contacts.2.key", "c");

        array.remove(&mut values, 1).unwrap();

        assert_eq!(array.len(&values), 2);
        assert_eq!(values.string(&array.field_path(1, &array.fields()[0])), "c");
        assert!(array.remove(&mut values, 5).is_none());
    }

    #[test]
    fn non_array_schema_is_rejected() {
        let schema = FieldSchema::new("title", FieldKind::Text);
        assert!(matches!(
            DynamicArray::from_schema(&schema),
            Err(FormError::NotAnArray(_))
        ));
    }

    #[test]
    fn occupied_path_is_not_an_array() {
        let array = contacts();
        let mut values = FormValues::new();
        values.set("contacts", "oops");
        let err = array.add(&mut values, &RecordingNotifier::new()).unwrap_err();
        assert!(matches!(err, FormError::NotAnArray(_)));
    }

    #[test]
    fn custom_refused_message() {
        let array = contacts().with_refused_message("Finish the contact first");
        let mut values = FormValues::new();
        let notifier = RecordingNotifier::new();
        array.add(&mut values, &notifier).unwrap();
        array.add(&mut values, &notifier).unwrap();
        assert_eq!(notifier.messages(), vec!["Finish the contact first".to_string()]);
    }
}
