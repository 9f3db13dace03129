//! Validation primitives and their composition.
//!
//! Every primitive is a pure function `(value, label, ..params)` returning
//! `Some(ValidationError)` on failure. Length and numeric primitives ignore
//! empty (trimmed) input; emptiness is the `required` check's business.

use std::sync::LazyLock;

use formwork_types::{
    FieldKind, FieldPath, FieldSchema, FieldValue, FileHandle, FormNode, FormValues, Rule,
    ValidationError, file_extension,
};
use regex::Regex;

use crate::find_schema;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

/// Minimum length accepted by [`strong_password`].
pub const PASSWORD_MIN_LENGTH: usize = 8;

pub fn required(value: &FieldValue, label: &str) -> Option<ValidationError> {
    let missing = value.is_blank() || matches!(value, FieldValue::Bool(false));
    missing.then(|| ValidationError::new(label, format!("{label} is required")))
}

pub fn min_length(value: &str, label: &str, min: usize) -> Option<ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.chars().count() >= min {
        return None;
    }
    Some(ValidationError::new(
        label,
        format!("{label} must be at least {min} characters"),
    ))
}

pub fn max_length(value: &str, label: &str, max: usize) -> Option<ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.chars().count() <= max {
        return None;
    }
    Some(ValidationError::new(
        label,
        format!("{label} must be at most {max} characters"),
    ))
}

pub fn min_value(value: f64, label: &str, min: f64) -> Option<ValidationError> {
    (value < min).then(|| ValidationError::new(label, format!("{label} must be at least {min}")))
}

pub fn max_value(value: f64, label: &str, max: f64) -> Option<ValidationError> {
    (value > max).then(|| ValidationError::new(label, format!("{label} must be at most {max}")))
}

pub fn number(value: &str, label: &str) -> Option<ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || parse_number(trimmed).is_some() {
        return None;
    }
    Some(ValidationError::new(label, format!("{label} must be a number")))
}

pub fn email(value: &str, label: &str) -> Option<ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || EMAIL.is_match(trimmed) {
        return None;
    }
    Some(ValidationError::new(
        label,
        format!("{label} must be a valid email address"),
    ))
}

/// At least [`PASSWORD_MIN_LENGTH`] characters with an uppercase letter, a
/// lowercase letter, a digit and a symbol.
pub fn strong_password(value: &str, label: &str) -> Option<ValidationError> {
    if value.is_empty() {
        return None;
    }
    let strong = value.chars().count() >= PASSWORD_MIN_LENGTH
        && value.chars().any(char::is_uppercase)
        && value.chars().any(char::is_lowercase)
        && value.chars().any(|c| c.is_ascii_digit())
        && value.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace());
    if strong {
        return None;
    }
    Some(ValidationError::new(
        label,
        format!(
            "{label} must be at least {PASSWORD_MIN_LENGTH} characters and contain an uppercase \
             letter, a lowercase letter, a number and a symbol"
        ),
    ))
}

pub fn one_of<S: AsRef<str>>(value: &str, label: &str, allowed: &[S]) -> Option<ValidationError> {
    if value.is_empty() || allowed.iter().any(|a| a.as_ref() == value) {
        return None;
    }
    let list = allowed
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ");
    Some(ValidationError::new(
        label,
        format!("{label} must be one of: {list}"),
    ))
}

/// Check a file against an accept specifier such as `"image/*,.pdf"`.
pub fn file_type(file: &FileHandle, label: &str, accept: &str) -> Option<ValidationError> {
    if accepts(accept, file) {
        return None;
    }
    Some(file_type_error(label, accept))
}

fn file_type_error(label: &str, accept: &str) -> ValidationError {
    ValidationError::new(label, format!("Only {accept} files are allowed"))
}

/// Whether `file` matches the comma-separated accept specifier.
///
/// An entry matches on an exact MIME type, on a `type/*` wildcard against
/// the MIME prefix, or on a dot-prefixed extension (case-insensitive). A
/// blank specifier accepts everything.
pub fn accepts(accept: &str, file: &FileHandle) -> bool {
    let entries: Vec<&str> = accept
        .split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .collect();
    if entries.is_empty() {
        return true;
    }

    let mime = file.mime.trim().to_ascii_lowercase();
    let mime_prefix = mime.split('/').next().unwrap_or_default();
    let extension = file_extension(&file.name);

    entries.iter().any(|entry| {
        let entry = entry.to_ascii_lowercase();
        if let Some(ext) = entry.strip_prefix('.') {
            extension.as_deref() == Some(ext)
        } else if let Some(prefix) = entry.strip_suffix("/*") {
            !mime.is_empty() && mime_prefix == prefix
        } else {
            !mime.is_empty() && mime == entry
        }
    })
}

/// Keep the failures, in evaluation order.
pub fn compose(
    results: impl IntoIterator<Item = Option<ValidationError>>,
) -> Vec<ValidationError> {
    results.into_iter().flatten().collect()
}

fn parse_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn numeric(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Number(n) => Some(*n),
        FieldValue::String(s) => parse_number(s.trim()),
        _ => None,
    }
}

/// Validate one field value against its schema.
///
/// The required check runs first; when it fails no other check reports.
/// Errors carry the schema name as `field`.
pub fn validate_field(schema: &FieldSchema, value: Option<&FieldValue>) -> Vec<ValidationError> {
    validate_at(schema, &schema.name, value)
}

fn validate_at(
    schema: &FieldSchema,
    path: &FieldPath,
    value: Option<&FieldValue>,
) -> Vec<ValidationError> {
    let label = schema.display_label();
    let value = value.unwrap_or(&FieldValue::Empty);

    let mut errors = if schema.required {
        compose([required(value, label)])
    } else {
        Vec::new()
    };
    if errors.is_empty() && !value.is_blank() {
        errors = compose(kind_checks(schema, value).into_iter().chain(
            schema.rules.iter().map(|rule| check_rule(rule, value, label)),
        ));
    }

    for error in &mut errors {
        error.field = path.to_string();
    }
    errors
}

fn kind_checks(schema: &FieldSchema, value: &FieldValue) -> Vec<Option<ValidationError>> {
    let label = schema.display_label();
    let text = value.as_str().unwrap_or_default();
    let accept = schema.accept.as_deref().unwrap_or_default();
    let option_values: Vec<&str> = schema.options.iter().map(|o| o.value.as_str()).collect();

    match schema.kind {
        FieldKind::Email => vec![email(text, label)],
        FieldKind::Number => vec![number(text, label)],
        FieldKind::Select | FieldKind::MultiSelect | FieldKind::Radio
            if !option_values.is_empty() =>
        {
            match value {
                FieldValue::Strings(values) => values
                    .iter()
                    .map(|v| one_of(v, label, option_values.as_slice()))
                    .collect(),
                _ => vec![one_of(text, label, option_values.as_slice())],
            }
        }
        FieldKind::File if value.is_invalid_file_type() => {
            vec![Some(file_type_error(label, accept))]
        }
        FieldKind::File => value
            .files()
            .iter()
            .map(|f| file_type(f, label, accept))
            .collect(),
        _ => Vec::new(),
    }
}

fn check_rule(rule: &Rule, value: &FieldValue, label: &str) -> Option<ValidationError> {
    let text = value.as_str().unwrap_or_default();
    match rule {
        Rule::MinLength(min) => min_length(text, label, *min),
        Rule::MaxLength(max) => max_length(text, label, *max),
        Rule::Min(min) => numeric(value).and_then(|n| min_value(n, label, *min)),
        Rule::Max(max) => numeric(value).and_then(|n| max_value(n, label, *max)),
        Rule::Email => email(text, label),
        Rule::StrongPassword => strong_password(text, label),
        Rule::OneOf(allowed) => match value {
            FieldValue::Strings(values) => values.iter().find_map(|v| one_of(v, label, allowed.as_slice())),
            _ => one_of(text, label, allowed.as_slice()),
        },
    }
}

/// Validate every field of a form, descending into dynamic-array entries.
pub fn validate_all(schemas: &[FieldSchema], values: &FormValues) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for schema in schemas {
        validate_into(schema, &schema.name, values, &mut errors);
    }
    errors
}

fn validate_into(
    schema: &FieldSchema,
    path: &FieldPath,
    values: &FormValues,
    errors: &mut Vec<ValidationError>,
) {
    if schema.kind != FieldKind::Array {
        errors.extend(validate_at(schema, path, values.value(path)));
        return;
    }

    let entries = values.list(path).map_or(0, <[FormNode]>::len);
    if schema.required && entries == 0 {
        let label = schema.display_label();
        errors.push(ValidationError::new(
            path.to_string(),
            format!("{label} is required"),
        ));
    }
    for index in 0..entries {
        let entry = path.index(index);
        for sub in &schema.fields {
            validate_into(sub, &entry.child(sub.name.as_str()), values, errors);
        }
    }
}

/// Validate a single leaf addressed by `path`, resolving array entry paths
/// (`contacts.0.key`) against the sub-schema.
pub fn validate_path(
    schemas: &[FieldSchema],
    path: &FieldPath,
    values: &FormValues,
) -> Vec<ValidationError> {
    match find_schema(schemas, path) {
        Some(schema) if schema.kind != FieldKind::Array => {
            validate_at(schema, path, values.value(path))
        }
        Some(schema) => {
            let mut errors = Vec::new();
            validate_into(schema, path, values, &mut errors);
            errors
        }
        None => Vec::new(),
    }
}
