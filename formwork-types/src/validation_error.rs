use std::fmt;

use serde::Serialize;

/// A field-scoped validation failure.
///
/// Validation failures are expected and recoverable by correcting the
/// input, so they are plain values rather than `Err`s.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ValidationError {
    /// The field the message belongs to.
    pub field: String,

    /// User-facing message.
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
