//! # VIOLATIONS
//!
//! **PURPOSE**: Request-time validation outcomes. These are data, never faults:
//! the engine accumulates them and hands the complete list back to the caller.

use super::constraint::ValueType;
use super::path::FieldPath;
use crate::errors::error_codes;
use crate::registry::Bucket;
use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

/// **VIOLATION TAXONOMY**
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    MissingRequiredField,
    TypeMismatch,
    IntegerViolation,
    OutOfRange,
    LengthViolation,
    EnumViolation,
    PatternMismatch,
    KeyValidationFailure,
    NoRecognizedFieldsSupplied,
    ArraySizeViolation,
    UnknownField,
}

impl ViolationKind {
    /// Stable machine-readable code for transport layers.
    pub fn code(&self) -> &'static str {
        match self {
            ViolationKind::MissingRequiredField => error_codes::MISSING_REQUIRED_FIELD,
            ViolationKind::TypeMismatch => error_codes::TYPE_MISMATCH,
            ViolationKind::IntegerViolation => error_codes::INTEGER_VIOLATION,
            ViolationKind::OutOfRange => error_codes::OUT_OF_RANGE,
            ViolationKind::LengthViolation => error_codes::LENGTH_VIOLATION,
            ViolationKind::EnumViolation => error_codes::ENUM_VIOLATION,
            ViolationKind::PatternMismatch => error_codes::PATTERN_MISMATCH,
            ViolationKind::KeyValidationFailure => error_codes::KEY_VALIDATION_FAILURE,
            ViolationKind::NoRecognizedFieldsSupplied => error_codes::NO_RECOGNIZED_FIELDS,
            ViolationKind::ArraySizeViolation => error_codes::ARRAY_SIZE_VIOLATION,
            ViolationKind::UnknownField => error_codes::UNKNOWN_FIELD,
        }
    }

    /// `IntegerOnly` failures are reported separately but belong to the type class.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(
            self,
            ViolationKind::TypeMismatch | ViolationKind::IntegerViolation
        )
    }
}

/// Parameters of the failed constraint, consumed by the message resolver.
#[derive(Debug, Clone, PartialEq)]
pub enum ViolationDetail {
    Missing,
    Empty,
    ExpectedType(ValueType),
    BelowMin(String),
    AboveMax(String),
    Allowed(Vec<JsonValue>),
    Pattern(String),
    InvalidKey(String),
    TooFewKeys(usize),
}

/// **SINGLE FAILED CONSTRAINT**
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<Bucket>,
    pub path: FieldPath,
    pub kind: ViolationKind,
    pub message: String,
    #[serde(skip)]
    pub detail: ViolationDetail,
}

impl Violation {
    /// Path including the bucket name when the violation came from a request.
    pub fn location(&self) -> String {
        match self.bucket {
            Some(bucket) => self.path.prefixed(bucket.as_str()),
            None => self.path.to_string(),
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

/// **ORDERED VIOLATION LIST**
///
/// Depth-first order within a bucket, buckets in `params`, `query`, `body` order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Error)]
#[error("VALIDATION ERROR: {} violation(s)", .violations.len())]
pub struct ValidationErrors {
    pub violations: Vec<Violation>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.violations.extend(other.violations);
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.violations.iter()
    }

    /// `(location, message)` pairs in report order.
    pub fn messages(&self) -> Vec<(String, String)> {
        self.violations
            .iter()
            .map(|violation| (violation.location(), violation.message.clone()))
            .collect()
    }

    pub fn of_kind(&self, kind: ViolationKind) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.kind == kind)
    }

    pub(crate) fn tag_bucket(&mut self, bucket: Bucket) {
        for violation in &mut self.violations {
            violation.bucket = Some(bucket);
        }
    }

    /// `Ok(value)` when nothing was collected.
    pub fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl IntoIterator for ValidationErrors {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation(kind: ViolationKind) -> Violation {
        Violation {
            bucket: None,
            path: FieldPath::root().child_key("grade"),
            kind,
            message: "\"grade\" is required".to_string(),
            detail: ViolationDetail::Missing,
        }
    }

    #[test]
    fn test_location_with_bucket() {
        let mut errors = ValidationErrors::new();
        errors.push(violation(ViolationKind::MissingRequiredField));
        errors.tag_bucket(Bucket::Body);
        assert_eq!(errors.violations[0].location(), "body.grade");
    }

    #[test]
    fn test_into_result() {
        assert_eq!(ValidationErrors::new().into_result(7), Ok(7));

        let mut errors = ValidationErrors::new();
        errors.push(violation(ViolationKind::OutOfRange));
        let err = errors.into_result(7).unwrap_err();
        assert_eq!(err.len(), 1);
        assert_eq!(err.to_string(), "VALIDATION ERROR: 1 violation(s)");
    }

    #[test]
    fn test_integer_violation_is_type_class() {
        assert!(ViolationKind::IntegerViolation.is_type_mismatch());
        assert!(ViolationKind::TypeMismatch.is_type_mismatch());
        assert!(!ViolationKind::OutOfRange.is_type_mismatch());
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(violation(ViolationKind::MissingRequiredField)).unwrap();
        assert_eq!(json["path"], "grade");
        assert_eq!(json["kind"], "missing_required_field");
        assert!(json.get("bucket").is_none());
        assert!(json.get("detail").is_none());
    }
}
