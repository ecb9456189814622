//! Validation error types.

use thiserror::Error;

/// One violated rule of a content schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("`{field}` is required")]
    MissingField { field: String },

    #[error("`{field}`: expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: String,
    },

    #[error("`{field}` must be unique, `{tag}` appears more than once")]
    DuplicateTag { field: String, tag: String },

    #[error("`{field}` must be at least {required} pixels wide, found {actual}")]
    ImageTooSmall {
        field: String,
        required: u32,
        actual: u32,
    },

    #[error("`{field}`: cannot read image `{src}`: {reason}")]
    ImageUnreadable {
        field: String,
        src: String,
        reason: String,
    },
}

/// Every violation found in one record, in schema field order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join_errors(.0))]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
