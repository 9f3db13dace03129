//! # formwork-egui
//!
//! A desktop backend for formwork that draws a [`formwork::Form`] with egui.
//!
//! All fields are displayed at once and can be edited in any order. Files
//! are attached by dropping them on the window; image previews are served
//! from egui's image cache and released when the form lets go of them.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use formwork::{FieldKind, FieldSchema, Form, FormDefinition};
//! use formwork_egui::EguiForm;
//!
//! fn main() -> anyhow::Result<()> {
//!     let definition = FormDefinition::new(vec![
//!         FieldSchema::new("name", FieldKind::Text).with_label("Name").required(),
//!         FieldSchema::new("logo", FieldKind::File).with_accept("image/*"),
//!     ])
//!     .with_title("Agency");
//!
//!     let submission = EguiForm::new()
//!         .with_title("Agency")
//!         .with_window_size([480.0, 400.0])
//!         .run(|allocator| Form::new(definition, allocator))?;
//!     println!("{}", serde_json::to_string_pretty(&submission)?);
//!     Ok(())
//! }
//! ```

mod allocator;
mod backend;

pub use allocator::EguiPreviewAllocator;
pub use backend::{EguiError, EguiForm, file_from_drop};
