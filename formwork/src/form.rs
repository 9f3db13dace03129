//! The form orchestrator: schemas, values, errors and renderers in one place.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use formwork_types::{
    BaseUrlResolver, ChangeEvent, FieldKind, FieldPath, FieldSchema, FormDefinition, FormError,
    FormStore, FormValues, Notifier, ValidationError,
};
use serde::Serialize;

use crate::attachments::{AttachmentOptions, ExistingFile, PreviewAllocator};
use crate::dynamic_array::{ADD_REFUSED_MESSAGE, DynamicArray};
use crate::find_schema;
use crate::normalize::ChangeSignal;
use crate::renderer::{FieldRenderer, FileSources, RenderedField, render_array};
use crate::validation::{validate_all, validate_path};

/// Form configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct FormOptions {
    /// Base URL existing-file paths are resolved against.
    base_url: String,
    /// Warning shown when an array add is refused.
    add_refused_message: String,
    attachments: AttachmentOptions,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl FormOptions {
    pub fn new() -> Self {
        Self {
            base_url: String::new(),
            add_refused_message: ADD_REFUSED_MESSAGE.to_string(),
            attachments: AttachmentOptions::default(),
        }
    }

    /// Set the base URL for existing files.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the warning shown when an array add is refused.
    pub fn with_add_refused_message(mut self, message: impl Into<String>) -> Self {
        self.add_refused_message = message.into();
        self
    }

    /// Set the attachment options used by file fields.
    pub fn with_attachments(mut self, attachments: AttachmentOptions) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// What a successful submit hands to the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub values: FormValues,
    /// Server paths marked for deletion, per file field.
    pub removed_files: BTreeMap<FieldPath, Vec<String>>,
}

/// A live form: the host store for values and errors plus one renderer per
/// leaf field.
///
/// Renderers are created the first time a field is rendered or changed.
/// Dropping the form drops them, which releases every preview handle.
pub struct Form<A: PreviewAllocator + Clone> {
    definition: FormDefinition,
    options: FormOptions,
    resolver: BaseUrlResolver,
    initial: FormValues,
    values: FormValues,
    errors: BTreeMap<FieldPath, String>,
    removed_files: BTreeMap<FieldPath, Vec<String>>,
    existing_files: BTreeMap<FieldPath, Vec<ExistingFile>>,
    renderers: BTreeMap<FieldPath, FieldRenderer<A>>,
    allocator: A,
}

impl<A: PreviewAllocator + Clone> Form<A> {
    /// Create a form with empty values.
    pub fn new(definition: FormDefinition, allocator: A) -> Self {
        Self {
            definition,
            options: FormOptions::default(),
            resolver: BaseUrlResolver::default(),
            initial: FormValues::new(),
            values: FormValues::new(),
            errors: BTreeMap::new(),
            removed_files: BTreeMap::new(),
            existing_files: BTreeMap::new(),
            renderers: BTreeMap::new(),
            allocator,
        }
    }

    /// Replace the options.
    pub fn with_options(mut self, options: FormOptions) -> Self {
        self.resolver = BaseUrlResolver::new(options.base_url.clone());
        self.options = options;
        self.renderers.clear();
        self
    }

    /// Start from existing values, e.g. a record loaded for editing.
    /// [`reset`](Self::reset) returns to these values.
    pub fn with_values(mut self, values: FormValues) -> Self {
        self.initial = values.clone();
        self.values = values;
        self
    }

    /// Attach files already stored on the server to a file field.
    pub fn with_existing_files(
        mut self,
        name: impl Into<FieldPath>,
        files: impl IntoIterator<Item = impl Into<ExistingFile>>,
    ) -> Self {
        self.existing_files
            .insert(name.into(), files.into_iter().map(Into::into).collect());
        self
    }

    pub fn definition(&self) -> &FormDefinition {
        &self.definition
    }

    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    /// Current error for `name`.
    pub fn error(&self, name: &FieldPath) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }

    /// All current errors, in path order.
    pub fn errors(&self) -> Vec<ValidationError> {
        self.errors
            .iter()
            .map(|(field, message)| ValidationError::new(field.to_string(), message.clone()))
            .collect()
    }

    /// Server paths marked for deletion for the file field `name`.
    pub fn removed_files(&self, name: &FieldPath) -> &[String] {
        self.removed_files.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Files already on the server for the file field `name`.
    pub fn existing_files(&self, name: &FieldPath) -> &[ExistingFile] {
        self.existing_files.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// The renderer of a leaf field, if it has been created.
    pub fn renderer(&self, name: &FieldPath) -> Option<&FieldRenderer<A>> {
        self.renderers.get(name)
    }

    /// Store a change event.
    ///
    /// The field's previous error is cleared before the value is stored; the
    /// field is then validated again.
    pub fn apply(&mut self, event: ChangeEvent) {
        let ChangeEvent {
            name,
            value,
            removed_files,
        } = event;

        self.errors.remove(&name);
        if let Some(removed) = removed_files {
            self.removed_files.insert(name.clone(), removed);
        }
        tracing::debug!(field = %name, value = value.type_name(), "applied change");
        self.values.set(name.clone(), value);
        self.revalidate(&name);
    }

    /// Feed a control signal for the leaf at `name` through its renderer.
    pub fn handle(&mut self, name: &FieldPath, signal: ChangeSignal) -> Result<(), FormError> {
        let (existing, removed) = self.file_state(name);
        let resolver = self.resolver.clone();
        let files = FileSources {
            existing: &existing,
            removed: &removed,
            resolver: Some(&resolver),
        };

        let event = self.renderer_mut(name)?.on_signal(signal, files)?;
        self.apply(event);
        Ok(())
    }

    /// Remove the attachment preview at `index` of the file field `name`.
    ///
    /// Returns `Ok(false)` when there is no preview at `index`.
    pub fn remove_file(&mut self, name: &FieldPath, index: usize) -> Result<bool, FormError> {
        let value = self.values.value(name).cloned().unwrap_or_default();
        let (existing, removed) = self.file_state(name);
        let resolver = self.resolver.clone();
        let files = FileSources {
            existing: &existing,
            removed: &removed,
            resolver: Some(&resolver),
        };

        match self.renderer_mut(name)?.remove_file(index, &value, files) {
            Some(event) => {
                self.apply(event);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Append an entry to the array at `name`, unless its last entry is
    /// incomplete. A refused add warns through `notifier`.
    pub fn add_entry(&mut self, name: &FieldPath, notifier: &dyn Notifier) -> Result<bool, FormError> {
        let array = self
            .array(name)?
            .with_refused_message(self.options.add_refused_message.clone());
        let added = array.add(self, notifier)?;
        if added {
            self.revalidate(name);
        }
        Ok(added)
    }

    /// Remove entry `index` of the array at `name`.
    ///
    /// Later entries move down by one. Errors, removed-file sets and existing
    /// files recorded under those entries move with them; their renderers are
    /// dropped and rebuilt on the next render.
    pub fn remove_entry(&mut self, name: &FieldPath, index: usize) -> Result<bool, FormError> {
        let array = self.array(name)?;
        if array.remove(self, index).is_none() {
            return Ok(false);
        }

        shift_entries(&mut self.errors, name, index);
        shift_entries(&mut self.removed_files, name, index);
        shift_entries(&mut self.existing_files, name, index);
        self.renderers.retain(|path, _| !path.starts_with(name));
        self.revalidate(name);
        Ok(true)
    }

    /// Describe every field of the form, in definition order.
    pub fn render(&mut self) -> Vec<RenderedField> {
        let schemas = self.definition.fields.clone();
        schemas
            .iter()
            .map(|schema| self.render_at(schema, schema.name.clone()))
            .collect()
    }

    /// Validate every field and replace the stored errors.
    pub fn validate(&mut self) -> Vec<ValidationError> {
        let errors = validate_all(self.definition.fields(), &self.values);
        self.errors.clear();
        for error in &errors {
            self.errors
                .entry(FieldPath::new(error.field.as_str()))
                .or_insert_with(|| error.message.clone());
        }
        errors
    }

    /// Validate and, if everything passes, hand back the values and
    /// removed-file sets.
    pub fn submit(&mut self) -> Result<Submission, Vec<ValidationError>> {
        let errors = self.validate();
        if !errors.is_empty() {
            tracing::debug!(errors = errors.len(), "submit blocked by validation");
            return Err(errors);
        }
        Ok(Submission {
            values: self.values.clone(),
            removed_files: self
                .removed_files
                .iter()
                .filter(|(_, removed)| !removed.is_empty())
                .map(|(name, removed)| (name.clone(), removed.clone()))
                .collect(),
        })
    }

    /// Restore the initial values, clear errors and removed-file sets and
    /// release every preview handle.
    pub fn reset(&mut self) {
        for renderer in self.renderers.values_mut() {
            renderer.teardown();
        }
        self.renderers.clear();
        self.values = self.initial.clone();
        self.errors.clear();
        self.removed_files.clear();
        tracing::debug!("form reset");
    }

    fn array(&self, name: &FieldPath) -> Result<DynamicArray, FormError> {
        let schema = find_schema(self.definition.fields(), name)
            .ok_or_else(|| FormError::UnknownField(name.clone()))?;
        if name.last().is_some_and(|s| s.parse::<usize>().is_ok()) {
            // An entry of an array, not the array itself.
            return Err(FormError::NotAnArray(name.clone()));
        }
        Ok(DynamicArray::from_schema(schema)?.at(name.clone()))
    }

    fn renderer_mut(&mut self, name: &FieldPath) -> Result<&mut FieldRenderer<A>, FormError> {
        match self.renderers.entry(name.clone()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let mut schema = find_schema(self.definition.fields(), name)
                    .filter(|s| s.kind != FieldKind::Array)
                    .cloned()
                    .ok_or_else(|| FormError::UnknownField(name.clone()))?;
                schema.name = name.clone();
                Ok(entry.insert(FieldRenderer::new(
                    schema,
                    self.allocator.clone(),
                    &self.options.attachments,
                )))
            }
        }
    }

    /// Owned copies of the existing files and removed set of `name`.
    fn file_state(&self, name: &FieldPath) -> (Vec<ExistingFile>, Vec<String>) {
        (
            self.existing_files(name).to_vec(),
            self.removed_files(name).to_vec(),
        )
    }

    fn render_at(&mut self, schema: &FieldSchema, name: FieldPath) -> RenderedField {
        if schema.kind == FieldKind::Array {
            let array = DynamicArray::new(name.clone(), schema.fields.clone());
            let mut entries = Vec::new();
            for index in 0..array.len(&self.values) {
                let mut row = Vec::with_capacity(schema.fields.len());
                for sub in &schema.fields {
                    row.push(self.render_at(sub, array.field_path(index, sub)));
                }
                entries.push(row);
            }
            let can_add = array.can_add(&self.values);
            return render_array(schema, name.clone(), entries, can_add, self.error(&name));
        }

        let renderer = match self.renderers.entry(name.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let mut schema = schema.clone();
                schema.name = name.clone();
                entry.insert(FieldRenderer::new(
                    schema,
                    self.allocator.clone(),
                    &self.options.attachments,
                ))
            }
        };
        let files = FileSources {
            existing: self.existing_files.get(&name).map(Vec::as_slice).unwrap_or_default(),
            removed: self.removed_files.get(&name).map(Vec::as_slice).unwrap_or_default(),
            resolver: Some(&self.resolver),
        };
        renderer.render(
            self.values.value(&name),
            self.errors.get(&name).map(String::as_str),
            files,
        )
    }

    fn revalidate(&mut self, name: &FieldPath) {
        let message = validate_path(self.definition.fields(), name, &self.values)
            .into_iter()
            .find(|e| e.field == name.as_str())
            .map(|e| e.message);
        match message {
            Some(message) => {
                self.errors.insert(name.clone(), message);
            }
            None => {
                self.errors.remove(name);
            }
        }
    }
}

impl<A: PreviewAllocator + Clone> FormStore for Form<A> {
    fn values(&self) -> &FormValues {
        &self.values
    }

    fn values_mut(&mut self) -> &mut FormValues {
        &mut self.values
    }

    fn error(&self, name: &FieldPath) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }

    fn apply(&mut self, event: ChangeEvent) {
        Form::apply(self, event);
    }
}

/// Move keys recorded under entries of `array` after `removed` down by one
/// position and drop the keys of the removed entry itself.
fn shift_entries<V>(map: &mut BTreeMap<FieldPath, V>, array: &FieldPath, removed: usize) {
    let affected: Vec<FieldPath> = map
        .keys()
        .filter(|key| entry_index(key, array).is_some_and(|i| i >= removed))
        .cloned()
        .collect();

    let mut moved = Vec::with_capacity(affected.len());
    for key in affected {
        let (Some(value), Some(index)) = (map.remove(&key), entry_index(&key, array)) else {
            continue;
        };
        if index == removed {
            continue;
        }
        let entry = array.index(index);
        let rest = key.strip_prefix(&entry).unwrap_or_else(FieldPath::empty);
        moved.push((array.index(index - 1).child(rest.as_str()), value));
    }
    map.extend(moved);
}

/// Position of the `array` entry that `key` lies in.
fn entry_index(key: &FieldPath, array: &FieldPath) -> Option<usize> {
    key.strip_prefix(array)?.first()?.parse().ok()
}
