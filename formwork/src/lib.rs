//! # formwork
//!
//! Schema-driven admin forms. Presentation-agnostic.
//!
//! A form is described by a [`FormDefinition`]: a list of [`FieldSchema`]s
//! naming each field, its [`FieldKind`], whether it is required, and extra
//! rules. The engine turns that description into renderable controls,
//! normalizes what the user does into [`ChangeEvent`]s, validates values,
//! manages repeatable groups and tracks file attachments.
//!
//! ## Usage
//!
//! ```rust
//! use formwork::testing::CountingAllocator;
//! use formwork::{ChangeSignal, FieldKind, FieldSchema, Form, FormDefinition};
//!
//! let definition = FormDefinition::new(vec![
//!     FieldSchema::new("email", FieldKind::Email).with_label("Email").required(),
//!     FieldSchema::new("age", FieldKind::Number).value_as_number(),
//! ]);
//! let mut form = Form::new(definition, CountingAllocator::new());
//!
//! form.handle(&"email".into(), ChangeSignal::Text("nope".into())).unwrap();
//! assert_eq!(
//!     form.error(&"email".into()),
//!     Some("Email must be a valid email address")
//! );
//!
//! form.handle(&"email".into(), ChangeSignal::Text("a@b.co".into())).unwrap();
//! let submission = form.submit().unwrap();
//! assert_eq!(submission.values.string(&"email".into()), "a@b.co");
//! ```
//!
//! ## Layers
//!
//! - [`normalize`] turns a [`ChangeSignal`] into a [`ChangeEvent`]
//! - [`validation`] holds the validation primitives and schema-driven checks
//! - [`AttachmentManager`] owns file previews and their temporary handles
//! - [`DynamicArray`] adds and removes entries of repeatable groups
//! - [`FieldRenderer`] turns a schema and value into a [`RenderedField`]
//! - [`Form`] ties everything to a value store
//!
//! ## Backends
//!
//! Backends draw [`RenderedField`]s and feed [`ChangeSignal`]s back:
//! - `formwork-egui` - GUI form via egui

pub use formwork_types::*;

mod attachments;
pub use attachments::{
    AttachmentManager, AttachmentOptions, DEFAULT_IMAGE_EXTENSIONS, ExistingFile, PreviewAllocator,
    PreviewEntry,
};

mod dynamic_array;
pub use dynamic_array::{ADD_REFUSED_MESSAGE, DynamicArray};

mod form;
pub use form::{Form, FormOptions, Submission};

mod normalize;
pub use normalize::{ChangeSignal, normalize};

mod renderer;
pub use renderer::{Control, FieldRenderer, FileSources, InputType, RenderedField, render_array};

pub mod validation;

// Test doubles for driving forms without a UI
pub mod testing;

/// Find the schema addressed by `path`.
///
/// Array entries are addressed positionally, so `contacts.0.key` resolves to
/// the `key` sub-field of the `contacts` array. A path naming an array entry
/// (`contacts.0`) resolves to the array itself.
pub fn find_schema<'a>(schemas: &'a [FieldSchema], path: &FieldPath) -> Option<&'a FieldSchema> {
    schemas.iter().find_map(|schema| {
        let rest = path.strip_prefix(&schema.name)?;
        if rest.is_empty() {
            return Some(schema);
        }
        if schema.kind != FieldKind::Array {
            return None;
        }
        let index = FieldPath::new(rest.first()?);
        index.as_str().parse::<usize>().ok()?;
        let rest = rest.strip_prefix(&index)?;
        if rest.is_empty() {
            Some(schema)
        } else {
            find_schema(&schema.fields, &rest)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schemas() -> Vec<FieldSchema> {
        vec![
            FieldSchema::new("title", FieldKind::Text),
            FieldSchema::array(
                "contacts",
                vec![
                    FieldSchema::new("key", FieldKind::Text).required(),
                    FieldSchema::array("tags", vec![FieldSchema::new("label", FieldKind::Text)]),
                ],
            ),
        ]
    }

    #[test]
    fn finds_top_level_and_nested_schemas() {
        let schemas = schemas();
        let find = |p: &str| find_schema(&schemas, &p.into()).map(|s| s.name.to_string());

        assert_eq!(find("title").as_deref(), Some("title"));
        assert_eq!(find("contacts").as_deref(), Some("contacts"));
        assert_eq!(find("contacts.0").as_deref(), Some("contacts"));
        assert_eq!(find("contacts.3.key").as_deref(), Some("key"));
        assert_eq!(find("contacts[1].tags[0].label").as_deref(), Some("label"));
    }

    #[test]
    fn unknown_paths_are_not_found() {
        let schemas = schemas();
        assert!(find_schema(&schemas, &"missing".into()).is_none());
        assert!(find_schema(&schemas, &"title.0".into()).is_none());
        assert!(find_schema(&schemas, &"contacts.x.key".into()).is_none());
        assert!(find_schema(&schemas, &"contacts.0.nope".into()).is_none());
    }

    #[test]
    fn dotted_names_match_whole_segments() {
        let schemas = vec![
            FieldSchema::new("seo.title", FieldKind::Text),
            FieldSchema::new("seo", FieldKind::Text),
        ];
        let found = find_schema(&schemas, &"seo.title".into()).unwrap();
        assert_eq!(found.name.as_str(), "seo.title");
        assert_eq!(find_schema(&schemas, &"seo".into()).unwrap().name.as_str(), "seo");
    }
}
