//! Field-level failure accumulator shared by every validation layer.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// A single field-level rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    pub field: String,
    pub message: String,
}

/// Accumulated violations, grouped by field.
///
/// Adding a failure never replaces an earlier one, even for the same field
/// and message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Fold every failure of `other` into `self`.
    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.fields {
            self.fields.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Total number of messages across all fields.
    pub fn len(&self) -> usize {
        self.fields.values().map(Vec::len).sum()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn messages_for(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The field -> messages mapping surfaced to callers.
    pub fn fields(&self) -> &BTreeMap<String, Vec<String>> {
        &self.fields
    }

    pub fn failures(&self) -> impl Iterator<Item = ValidationFailure> + '_ {
        self.fields.iter().flat_map(|(field, messages)| {
            messages.iter().map(move |message| ValidationFailure {
                field: field.clone(),
                message: message.clone(),
            })
        })
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for failure in self.failures() {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", failure.field, failure.message)?;
            first = false;
        }
        Ok(())
    }
}

impl FromIterator<ValidationFailure> for ValidationErrors {
    fn from_iter<I: IntoIterator<Item = ValidationFailure>>(iter: I) -> Self {
        let mut errors = Self::new();
        for failure in iter {
            errors.add(failure.field, failure.message);
        }
        errors
    }
}

/// Structural constraints declared with `#[derive(Validate)]` report through
/// the same accumulator. A rule without a message falls back to its code.
impl From<validator::ValidationErrors> for ValidationErrors {
    fn from(source: validator::ValidationErrors) -> Self {
        let mut errors = Self::new();
        for (field, field_errors) in source.field_errors() {
            for error in field_errors.iter() {
                let message = error
                    .message
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| error.code.to_string());
                errors.add(field.to_string(), message);
            }
        }
        errors
    }
}
