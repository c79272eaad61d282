//! # Field Validation Errors
//!
//! Field-level errors accumulated by the validate operations and surfaced in
//! admission responses.

/// Kind of a field validation error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldErrorKind {
    /// The field value is invalid
    Invalid,
    /// The field is required but missing
    Required,
    /// The field may not be set or changed
    Forbidden,
}

/// A single field validation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Dotted path of the field, e.g. `spec.instanceRef.region`
    pub field: String,
    pub kind: FieldErrorKind,
    pub detail: String,
}

/// List of field validation errors; empty means the object is valid
pub type FieldErrorList = Vec<FieldError>;

impl FieldError {
    pub fn invalid(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: FieldErrorKind::Invalid,
            detail: detail.into(),
        }
    }

    pub fn required(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: FieldErrorKind::Required,
            detail: detail.into(),
        }
    }

    pub fn forbidden(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: FieldErrorKind::Forbidden,
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            FieldErrorKind::Invalid => "Invalid value",
            FieldErrorKind::Required => "Required value",
            FieldErrorKind::Forbidden => "Forbidden",
        };
        write!(f, "{}: {}: {}", self.field, kind, self.detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_field_and_kind() {
        let err = FieldError::forbidden("spec.region", "field is immutable");
        assert_eq!(err.to_string(), "spec.region: Forbidden: field is immutable");
    }
}
