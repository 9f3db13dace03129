use crate::{FieldKind, FieldPath};

/// Error type for form engine operations.
///
/// Validation failures and rejected file selections are not errors: they
/// travel as [`ValidationError`](crate::ValidationError) values and as the
/// invalid-file sentinel respectively.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// A control produced a signal that its field kind cannot interpret.
    #[error("Field '{name}' of kind {kind} cannot handle a {signal} signal")]
    SignalMismatch {
        name: FieldPath,
        kind: &'static str,
        signal: &'static str,
    },

    /// No schema is registered under the given path.
    #[error("Unknown field: {0}")]
    UnknownField(FieldPath),

    /// The path does not address a dynamic array.
    #[error("Field '{0}' is not an array")]
    NotAnArray(FieldPath),

    /// A schema document could not be parsed.
    #[error("Invalid form schema: {0}")]
    Schema(#[from] serde_json::Error),

    /// Backend-specific failure (I/O, UI framework crash, etc.)
    #[error("Backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

impl FormError {
    /// Create a backend error from any error type.
    pub fn backend(err: impl Into<anyhow::Error>) -> Self {
        Self::Backend(err.into())
    }

    /// Create a signal mismatch error.
    pub fn signal_mismatch(name: &FieldPath, kind: FieldKind, signal: &'static str) -> Self {
        Self::SignalMismatch {
            name: name.clone(),
            kind: kind.as_str(),
            signal,
        }
    }
}
