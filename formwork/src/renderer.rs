//! Field rendering: schema + value + error to a concrete control.
//!
//! The renderer does not draw anything. It produces a [`RenderedField`]
//! that a backend turns into widgets, and accepts the [`ChangeSignal`]s
//! those widgets report.

use formwork_types::{
    ChangeEvent, ChoiceOption, FieldKind, FieldPath, FieldSchema, FieldValue, FormError,
    UrlResolver,
};

use crate::attachments::{AttachmentManager, AttachmentOptions, ExistingFile, PreviewAllocator, PreviewEntry};
use crate::normalize::{ChangeSignal, normalize};

/// Native input type of a single-line text control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    Text,
    Email,
    Number,
    Date,
    Password,
}

impl InputType {
    fn for_kind(kind: FieldKind) -> Option<Self> {
        match kind {
            FieldKind::Text => Some(Self::Text),
            FieldKind::Email => Some(Self::Email),
            FieldKind::Number => Some(Self::Number),
            FieldKind::Date => Some(Self::Date),
            FieldKind::Password => Some(Self::Password),
            _ => None,
        }
    }

    /// Whether the control should mask its contents.
    pub fn is_masked(self) -> bool {
        self == Self::Password
    }
}

/// The concrete control chosen for a field.
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    /// Single-line input.
    TextInput { input_type: InputType, value: String },

    /// Multi-line input.
    TextArea { value: String },

    /// Dropdown with one choice.
    Select {
        options: Vec<ChoiceOption>,
        selected: Option<usize>,
    },

    /// List allowing several choices.
    MultiSelect {
        options: Vec<ChoiceOption>,
        selected: Vec<usize>,
    },

    Checkbox { checked: bool },

    /// Radio buttons, one per option.
    RadioGroup {
        options: Vec<ChoiceOption>,
        selected: Option<usize>,
    },

    /// File picker with its attachment previews.
    FilePicker {
        accept: Option<String>,
        multiple: bool,
        previews: Vec<PreviewEntry>,
        /// The last selection was rejected; the picker should show no files.
        reset_picker: bool,
    },

    /// Repeatable group of sub-fields, one row of fields per entry.
    Array {
        entries: Vec<Vec<RenderedField>>,
        can_add: bool,
    },
}

/// Everything a backend needs to draw one field.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedField {
    pub name: FieldPath,
    pub label: String,
    pub required: bool,
    pub disabled: bool,
    pub read_only: bool,
    pub class_name: Option<String>,
    pub placeholder: Option<String>,
    pub control: Control,
    /// Error shown beneath the control.
    pub error: Option<String>,
}

impl RenderedField {
    fn new(schema: &FieldSchema, name: FieldPath, control: Control, error: Option<&str>) -> Self {
        Self {
            name,
            label: schema.display_label().to_string(),
            required: schema.required,
            disabled: schema.disabled,
            read_only: schema.read_only,
            class_name: schema.class_name.clone(),
            placeholder: schema.placeholder.clone(),
            control,
            error: error.map(str::to_string),
        }
    }

    /// Whether the user may change the control.
    pub fn is_editable(&self) -> bool {
        !self.disabled && !self.read_only
    }
}

/// Where a file field's existing attachments come from.
#[derive(Clone, Copy, Default)]
pub struct FileSources<'a> {
    pub existing: &'a [ExistingFile],
    pub removed: &'a [String],
    pub resolver: Option<&'a dyn UrlResolver>,
}

/// Renders one leaf field and normalizes its signals.
///
/// File fields own an [`AttachmentManager`]; dropping the renderer releases
/// its preview handles.
pub struct FieldRenderer<A: PreviewAllocator> {
    schema: FieldSchema,
    attachments: Option<AttachmentManager<A>>,
}

impl<A: PreviewAllocator> FieldRenderer<A> {
    /// Create a renderer. The schema's `name` is the path the field's
    /// events are addressed to.
    pub fn new(schema: FieldSchema, allocator: A, options: &AttachmentOptions) -> Self {
        let attachments = (schema.kind == FieldKind::File)
            .then(|| AttachmentManager::new(&schema, allocator).with_options(options.clone()));
        Self {
            schema,
            attachments,
        }
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    pub fn attachments(&self) -> Option<&AttachmentManager<A>> {
        self.attachments.as_ref()
    }

    /// Describe the control for `value`, with `error` beneath it.
    ///
    /// File fields sync their previews against `files` first.
    pub fn render(
        &mut self,
        value: Option<&FieldValue>,
        error: Option<&str>,
        files: FileSources<'_>,
    ) -> RenderedField {
        let value = value.unwrap_or(&FieldValue::Empty);
        let schema = &self.schema;
        let text = || value.display_text();
        let selected = || value.as_str().and_then(|v| schema.option_index(v));

        let control = match schema.kind {
            FieldKind::Textarea => Control::TextArea { value: text() },
            FieldKind::Checkbox => Control::Checkbox {
                checked: value.as_bool().unwrap_or(false),
            },
            FieldKind::Radio => Control::RadioGroup {
                options: schema.options.clone(),
                selected: selected(),
            },
            _ if schema.is_multi_select() => Control::MultiSelect {
                options: schema.options.clone(),
                selected: value
                    .as_strings()
                    .unwrap_or_default()
                    .iter()
                    .filter_map(|v| schema.option_index(v))
                    .collect(),
            },
            FieldKind::Select | FieldKind::MultiSelect => Control::Select {
                options: schema.options.clone(),
                selected: selected(),
            },
            FieldKind::File => {
                let previews = match &mut self.attachments {
                    Some(manager) => {
                        manager.sync(value, files.existing, files.removed, files.resolver);
                        manager.previews().to_vec()
                    }
                    None => Vec::new(),
                };
                Control::FilePicker {
                    accept: schema.accept.clone(),
                    multiple: schema.multiple,
                    previews,
                    reset_picker: value.is_invalid_file_type(),
                }
            }
            FieldKind::Array => Control::Array {
                entries: Vec::new(),
                can_add: true,
            },
            kind => Control::TextInput {
                input_type: InputType::for_kind(kind).unwrap_or(InputType::Text),
                value: text(),
            },
        };

        RenderedField::new(&self.schema, self.schema.name.clone(), control, error)
    }

    /// Bring the attachment previews up to date without rendering.
    pub fn sync_attachments(&mut self, value: &FieldValue, files: FileSources<'_>) -> bool {
        match &mut self.attachments {
            Some(manager) => manager.sync(value, files.existing, files.removed, files.resolver),
            None => false,
        }
    }

    /// Turn a control's signal into a change event.
    ///
    /// A file selection carries `files.removed` forward.
    pub fn on_signal(
        &mut self,
        signal: ChangeSignal,
        files: FileSources<'_>,
    ) -> Result<ChangeEvent, FormError> {
        match (&self.attachments, signal) {
            (Some(manager), ChangeSignal::Files(picked)) => {
                Ok(manager.select(picked, files.removed))
            }
            (_, signal) => normalize(&self.schema, signal),
        }
    }

    /// Remove the attachment preview at `index`, after bringing the
    /// previews up to date with `files`. Returns `None` for non-file fields
    /// or an out-of-range index.
    pub fn remove_file(
        &mut self,
        index: usize,
        value: &FieldValue,
        files: FileSources<'_>,
    ) -> Option<ChangeEvent> {
        let manager = self.attachments.as_mut()?;
        manager.sync(value, files.existing, files.removed, files.resolver);
        manager.remove(index, value, files.removed)
    }

    /// Release every preview handle held by this renderer.
    pub fn teardown(&mut self) {
        if let Some(manager) = &mut self.attachments {
            manager.teardown();
        }
    }
}

/// Describe an array field from its already-rendered entries.
pub fn render_array(
    schema: &FieldSchema,
    name: FieldPath,
    entries: Vec<Vec<RenderedField>>,
    can_add: bool,
    error: Option<&str>,
) -> RenderedField {
    RenderedField::new(schema, name, Control::Array { entries, can_add }, error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CountingAllocator;
    use formwork_types::FileHandle;

    fn renderer(schema: FieldSchema) -> FieldRenderer<CountingAllocator> {
        FieldRenderer::new(schema, CountingAllocator::new(), &AttachmentOptions::default())
    }

    fn options() -> Vec<ChoiceOption> {
        vec![ChoiceOption::new("A", "Alpha"), ChoiceOption::new("B", "Beta")]
    }

    #[test]
    fn text_kinds_pick_input_type() {
        let cases = [
            (FieldKind::Text, InputType::Text),
            (FieldKind::Email, InputType::Email),
            (FieldKind::Number, InputType::Number),
            (FieldKind::Date, InputType::Date),
            (FieldKind::Password, InputType::Password),
        ];
        for (kind, expected) in cases {
            let mut r = renderer(FieldSchema::new("f", kind));
            let field = r.render(Some(&FieldValue::from("x")), None, FileSources::default());
            assert_eq!(
                field.control,
                Control::TextInput {
                    input_type: expected,
                    value: "x".to_string()
                }
            );
        }
    }

    #[test]
    fn every_kind_carries_its_error() {
        let kinds = [
            FieldKind::Text,
            FieldKind::Textarea,
            FieldKind::Select,
            FieldKind::MultiSelect,
            FieldKind::Checkbox,
            FieldKind::Radio,
            FieldKind::File,
        ];
        for kind in kinds {
            let mut r = renderer(FieldSchema::new("f", kind).with_options(options()));
            let field = r.render(None, Some("f is required"), FileSources::default());
            assert_eq!(field.error.as_deref(), Some("f is required"), "{kind:?}");
        }
    }

    #[test]
    fn flags_pass_through() {
        let schema = FieldSchema::new("slug", FieldKind::Text)
            .with_label("Slug")
            .required()
            .read_only()
            .with_class_name("col-6")
            .with_placeholder("my-page");
        let field = renderer(schema).render(None, None, FileSources::default());

        assert_eq!(field.label, "Slug");
        assert!(field.required && field.read_only && !field.disabled);
        assert!(!field.is_editable());
        assert_eq!(field.class_name.as_deref(), Some("col-6"));
        assert_eq!(field.placeholder.as_deref(), Some("my-page"));
    }

    #[test]
    fn choices_resolve_selected_indices() {
        let mut select = renderer(FieldSchema::new("s", FieldKind::Select).with_options(options()));
        let field = select.render(Some(&FieldValue::from("B")), None, FileSources::default());
        assert!(matches!(field.control, Control::Select { selected: Some(1), .. }));

        let mut multi = renderer(
            FieldSchema::new("m", FieldKind::Select)
                .with_options(options())
                .multiple(),
        );
        let value = FieldValue::Strings(vec!["B".into(), "Z".into(), "A".into()]);
        let field = multi.render(Some(&value), None, FileSources::default());
        match field.control {
            Control::MultiSelect { selected, .. } => assert_eq!(selected, vec![1, 0]),
            other => panic!("unexpected control {other:?}"),
        }
    }

    #[test]
    fn file_picker_previews_and_reset() {
        let mut r = renderer(FieldSchema::new("logo", FieldKind::File).with_accept("image/*"));
        let existing = vec![ExistingFile::new("/u/logo.png")];
        let sources = FileSources {
            existing: &existing,
            ..FileSources::default()
        };

        let field = r.render(None, None, sources);
        match field.control {
            Control::FilePicker {
                previews,
                reset_picker,
                ..
            } => {
                assert_eq!(previews.len(), 1);
                assert!(!reset_picker);
            }
            other => panic!("unexpected control {other:?}"),
        }

        let event = r
            .on_signal(
                ChangeSignal::Files(vec![FileHandle::new("a.txt", "text/plain")]),
                sources,
            )
            .unwrap();
        assert!(event.value.is_invalid_file_type());
        let field = r.render(Some(&event.value), None, sources);
        assert!(matches!(
            field.control,
            Control::FilePicker { reset_picker: true, .. }
        ));
    }

    #[test]
    fn signals_route_through_normalizer() {
        let mut r = renderer(FieldSchema::new("active", FieldKind::Checkbox));
        let none = FileSources::default();
        let event = r.on_signal(ChangeSignal::Checked(true), none).unwrap();
        assert_eq!(event, ChangeEvent::new("active", true));
        assert!(r.on_signal(ChangeSignal::Files(Vec::new()), none).is_err());
        assert!(r.remove_file(0, &FieldValue::Empty, none).is_none());
    }

    #[test]
    fn dropping_renderer_releases_handles() {
        let allocator = CountingAllocator::new();
        let mut r = FieldRenderer::new(
            FieldSchema::new("gallery", FieldKind::File).multiple(),
            allocator.clone(),
            &AttachmentOptions::default(),
        );
        let value = FieldValue::Files(vec![FileHandle::new("a.png", "image/png")]);
        r.render(Some(&value), None, FileSources::default());
        assert_eq!(allocator.outstanding(), 1);

        drop(r);
        assert_eq!(allocator.outstanding(), 0);
        assert_eq!(allocator.double_releases(), 0);
    }
}
