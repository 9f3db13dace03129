//! Conversion of native control signals into canonical change events.

use formwork_types::{ChangeEvent, FieldKind, FieldSchema, FieldValue, FileHandle, FormError};

/// What a control reports when its user changes it.
///
/// Backends translate their framework's callbacks into one of these
/// variants; nothing downstream inspects native event shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeSignal {
    /// Raw text of a text-like input.
    Text(String),

    /// Checked state of a checkbox.
    Checked(bool),

    /// Index of the chosen option of a single select or radio group.
    Selected(Option<usize>),

    /// Indices of the chosen options of a multi-select.
    SelectedMany(Vec<usize>),

    /// Files picked in a file input.
    Files(Vec<FileHandle>),
}

impl ChangeSignal {
    /// Short name used in mismatch errors and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Checked(_) => "checked",
            Self::Selected(_) => "selected",
            Self::SelectedMany(_) => "selected-many",
            Self::Files(_) => "files",
        }
    }
}

/// Normalize a signal for a non-file field.
///
/// File signals are handled by the attachment manager, which owns the
/// preview state they affect; passing one here is a [`FormError::SignalMismatch`].
pub fn normalize(schema: &FieldSchema, signal: ChangeSignal) -> Result<ChangeEvent, FormError> {
    let value = match (schema.kind, signal) {
        (FieldKind::Number, ChangeSignal::Text(raw)) if schema.value_as_number => {
            coerce_number(raw)
        }
        (kind, ChangeSignal::Text(raw)) if kind.is_text_like() => FieldValue::String(raw),
        (FieldKind::Checkbox, ChangeSignal::Checked(checked)) => FieldValue::Bool(checked),
        (FieldKind::Radio | FieldKind::Select, ChangeSignal::Selected(index))
            if !schema.is_multi_select() =>
        {
            FieldValue::String(
                index
                    .and_then(|i| schema.options.get(i))
                    .map(|o| o.value.clone())
                    .unwrap_or_default(),
            )
        }
        (FieldKind::Select | FieldKind::MultiSelect, ChangeSignal::SelectedMany(mut indices))
            if schema.is_multi_select() =>
        {
            indices.sort_unstable();
            indices.dedup();
            FieldValue::Strings(
                indices
                    .into_iter()
                    .filter_map(|i| schema.options.get(i))
                    .map(|o| o.value.clone())
                    .collect(),
            )
        }
        (kind, signal) => {
            return Err(FormError::signal_mismatch(&schema.name, kind, signal.name()));
        }
    };

    tracing::trace!(field = %schema.name, value = value.type_name(), "normalized change");
    Ok(ChangeEvent::new(schema.name.clone(), value))
}

/// Empty input becomes [`FieldValue::Empty`]; text that is not a finite
/// number is passed through unchanged so validation can report it.
fn coerce_number(raw: String) -> FieldValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return FieldValue::Empty;
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => FieldValue::Number(n),
        _ => FieldValue::String(raw),
    }
}
