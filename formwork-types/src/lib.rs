//! Core types for the formwork crate.
//!
//! This crate provides the foundational, presentation-agnostic types:
//! - `FieldSchema` and `FieldKind` - Declarative field descriptors
//! - `FormDefinition` - The list of fields making up one screen
//! - `FieldValue`, `FileHandle` - Values carried by change events
//! - `ChangeEvent` - The canonical change-event shape
//! - `FormValues` and `FieldPath` - The value tree and path-based keys
//! - `FormStore`, `Notifier`, `UrlResolver` - Traits for external collaborators

mod field_path;
pub use field_path::FieldPath;

mod field_value;
pub use field_value::{FieldValue, FileHandle, INVALID_FILE_TYPE, file_extension};

mod field_schema;
pub use field_schema::{ChoiceOption, FieldKind, FieldSchema, Rule};

mod form_definition;
pub use form_definition::FormDefinition;

mod change_event;
pub use change_event::ChangeEvent;

mod form_values;
pub use form_values::{FormNode, FormValues};

mod validation_error;
pub use validation_error::ValidationError;

mod error;
pub use error::FormError;

mod traits;
pub use traits::{BaseUrlResolver, FormStore, Notifier, TracingNotifier, UrlResolver};
