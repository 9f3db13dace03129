use std::fmt;
use std::sync::Arc;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Sentinel emitted in place of a file value when a selection is rejected
/// by the field's accept filter.
pub const INVALID_FILE_TYPE: &str = "__invalid_file_type__";

/// A file picked on the client that has not been uploaded yet.
///
/// The contents are shared, so cloning a handle (and therefore a
/// [`FieldValue`] holding it) never copies the bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct FileHandle {
    /// File name as reported by the picker, e.g. `"logo.png"`.
    pub name: String,

    /// MIME type as reported by the picker. May be empty when unknown.
    pub mime: String,

    /// Size in bytes.
    pub size: u64,

    /// File contents, when the picker provided them.
    pub bytes: Option<Arc<[u8]>>,
}

impl FileHandle {
    /// Create a handle without contents.
    pub fn new(name: impl Into<String>, mime: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            size: 0,
            bytes: None,
        }
    }

    /// Attach file contents; `size` follows the byte count.
    pub fn with_bytes(mut self, bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        self.size = bytes.len() as u64;
        self.bytes = Some(bytes);
        self
    }

    /// Lower-cased extension of the file name, without the dot.
    pub fn extension(&self) -> Option<String> {
        file_extension(&self.name)
    }

    /// Whether the picker reported an `image/*` MIME type.
    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }
}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandle")
            .field("name", &self.name)
            .field("mime", &self.mime)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl Serialize for FileHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FileHandle", 3)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("type", &self.mime)?;
        state.serialize_field("size", &self.size)?;
        state.end()
    }
}

/// Lower-cased extension of a file name or path, without the dot.
pub fn file_extension(name: &str) -> Option<String> {
    let file = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let (stem, ext) = file.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// A single value carried by a change event and stored in the value tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FieldValue {
    /// No value: a cleared numeric input, or no file attached.
    #[default]
    Empty,

    /// Raw text from text-like inputs, and single choice values.
    String(String),

    /// A coerced number (`valueAsNumber` inputs).
    Number(f64),

    /// Checkbox state.
    Bool(bool),

    /// Ordered option values of a multi-select.
    Strings(Vec<String>),

    /// A single not-yet-uploaded file.
    File(FileHandle),

    /// An ordered list of not-yet-uploaded files.
    Files(Vec<FileHandle>),

    /// A rejected file selection; serializes as [`INVALID_FILE_TYPE`].
    InvalidFileType,
}

impl FieldValue {
    /// Try to get this value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::InvalidFileType => Some(INVALID_FILE_TYPE),
            _ => None,
        }
    }

    /// Try to get this value as a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get this value as a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get this value as a list of strings.
    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            Self::Strings(values) => Some(values),
            _ => None,
        }
    }

    /// The files held by this value, in order. Empty for non-file values.
    pub fn files(&self) -> &[FileHandle] {
        match self {
            Self::File(file) => std::slice::from_ref(file),
            Self::Files(files) => files,
            _ => &[],
        }
    }

    /// Whether this is the rejected-selection sentinel.
    pub fn is_invalid_file_type(&self) -> bool {
        matches!(self, Self::InvalidFileType)
    }

    /// Whether the value counts as "not provided" for required checks.
    ///
    /// Strings are trimmed. `false` checkboxes are not blank; a checkbox
    /// that must be ticked is expressed with a rule, not with `required`.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::String(s) => s.trim().is_empty(),
            Self::Number(n) => n.is_nan(),
            Self::Bool(_) => false,
            Self::Strings(values) => values.is_empty(),
            Self::File(_) => false,
            Self::Files(files) => files.is_empty(),
            Self::InvalidFileType => false,
        }
    }

    /// Get the type name of this value for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Empty => "Empty",
            Self::String(_) => "String",
            Self::Number(_) => "Number",
            Self::Bool(_) => "Bool",
            Self::Strings(_) => "Strings",
            Self::File(_) => "File",
            Self::Files(_) => "Files",
            Self::InvalidFileType => "InvalidFileType",
        }
    }

    /// Text shown in an input bound to this value.
    pub fn display_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::String(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Strings(values) => values.join(", "),
            Self::File(file) => file.name.clone(),
            Self::Files(files) => files
                .iter()
                .map(|f| f.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            Self::InvalidFileType => String::new(),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Empty => serializer.serialize_none(),
            Self::String(s) => serializer.serialize_str(s),
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Strings(values) => values.serialize(serializer),
            Self::File(file) => file.serialize(serializer),
            Self::Files(files) => files.serialize(serializer),
            Self::InvalidFileType => serializer.serialize_str(INVALID_FILE_TYPE),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        Self::Strings(values)
    }
}

impl From<FileHandle> for FieldValue {
    fn from(file: FileHandle) -> Self {
        Self::File(file)
    }
}

impl From<Vec<FileHandle>> for FieldValue {
    fn from(files: Vec<FileHandle>) -> Self {
        Self::Files(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_serializes_as_string() {
        let json = serde_json::to_string(&FieldValue::InvalidFileType).unwrap();
        assert_eq!(json, format!("\"{INVALID_FILE_TYPE}\""));
        assert_eq!(
            FieldValue::InvalidFileType.as_str(),
            Some("__invalid_file_type__")
        );
    }

    #[test]
    fn files_are_serialized_without_contents() {
        let file = FileHandle::new("a.png", "image/png").with_bytes(vec![1u8, 2, 3]);
        let json = serde_json::to_value(FieldValue::Files(vec![file])).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{ "name": "a.png", "type": "image/png", "size": 3 }])
        );
    }

    #[test]
    fn blank_values() {
        assert!(FieldValue::Empty.is_blank());
        assert!(FieldValue::from("   ").is_blank());
        assert!(FieldValue::Files(Vec::new()).is_blank());
        assert!(!FieldValue::from("x").is_blank());
        assert!(!FieldValue::Bool(false).is_blank());
        assert!(!FieldValue::Number(0.0).is_blank());
    }

    #[test]
    fn extensions() {
        assert_eq!(file_extension("/uploads/Logo.PNG").as_deref(), Some("png"));
        assert_eq!(file_extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(file_extension(".bashrc"), None);
        assert_eq!(file_extension("README"), None);
    }

    #[test]
    fn files_view() {
        let a = FileHandle::new("a.png", "image/png");
        assert_eq!(FieldValue::File(a.clone()).files(), &[a.clone()]);
        assert!(FieldValue::from("a.png").files().is_empty());
    }
}
