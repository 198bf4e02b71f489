//! # CONSTRAINTS
//!
//! **PURPOSE**: Atomic rules as tagged data. A node composes several of them
//! conjunctively; the engine interprets them in a fixed order:
//! presence, type, then refinements in declaration order.

use super::violation::{ViolationDetail, ViolationKind};
use crate::errors::{error_codes, ProjectError};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value as JsonValue};
use std::fmt;

/// Largest integer a JSON number can carry without losing precision.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// **JSON TYPE ENUMERATION**
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Number,
    String,
    Boolean,
    Object,
    Array,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Number => "number",
            ValueType::String => "string",
            ValueType::Boolean => "boolean",
            ValueType::Object => "object",
            ValueType::Array => "array",
        }
    }

    pub fn matches(&self, value: &JsonValue) -> bool {
        matches!(
            (self, value),
            (ValueType::Number, JsonValue::Number(_))
                | (ValueType::String, JsonValue::String(_))
                | (ValueType::Boolean, JsonValue::Bool(_))
                | (ValueType::Object, JsonValue::Object(_))
                | (ValueType::Array, JsonValue::Array(_))
        )
    }

    /// Returns the value as this type, converting strings when `convert` is set.
    pub fn coerce(&self, value: &JsonValue, convert: bool) -> Option<JsonValue> {
        if self.matches(value) {
            return Some(value.clone());
        }
        if !convert {
            return None;
        }
        match (self, value) {
            (ValueType::Number, JsonValue::String(raw)) => parse_number(raw),
            (ValueType::Boolean, JsonValue::String(raw)) => {
                match raw.trim().to_ascii_lowercase().as_str() {
                    "true" => Some(JsonValue::Bool(true)),
                    "false" => Some(JsonValue::Bool(false)),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a numeric string into the narrowest JSON number.
/// Integral text that no JSON number can hold exactly is rejected.
pub fn parse_number(raw: &str) -> Option<JsonValue> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(integer) = trimmed.parse::<i64>() {
        return Some(JsonValue::from(integer));
    }
    if let Ok(integer) = trimmed.parse::<u64>() {
        return Some(JsonValue::from(integer));
    }
    let parsed: f64 = trimmed.parse().ok()?;
    if !parsed.is_finite() {
        return None;
    }
    if parsed.fract() == 0.0 {
        // past 2^53 the float no longer names the digits that were sent
        return (parsed.abs() <= MAX_SAFE_INTEGER).then(|| JsonValue::from(parsed as i64));
    }
    Number::from_f64(parsed).map(JsonValue::Number)
}

/// Formats a bound the way it appears in messages (`100`, not `100.0`).
pub fn format_number(number: f64) -> String {
    format!("{}", number)
}

/// Equality that treats `1` and `1.0` as the same literal.
pub fn literal_eq(left: &JsonValue, right: &JsonValue) -> bool {
    match (left, right) {
        (JsonValue::Number(a), JsonValue::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

/// **REGEX CONSTRAINT** - compiled once at schema build time
#[derive(Debug, Clone)]
pub struct PatternRule {
    source: String,
    flags: String,
    regex: Regex,
}

impl PatternRule {
    /// Supported flags: `i` case-insensitive, `m` multi-line, `s` dot matches newline,
    /// `x` ignore whitespace.
    pub fn new(source: &str, flags: &str) -> Result<Self, ProjectError> {
        let mut builder = RegexBuilder::new(source);
        for flag in flags.chars() {
            match flag {
                'i' => builder.case_insensitive(true),
                'm' => builder.multi_line(true),
                's' => builder.dot_matches_new_line(true),
                'x' => builder.ignore_whitespace(true),
                other => {
                    return Err(ProjectError::schema(
                        error_codes::INVALID_PATTERN,
                        format!("Unsupported regex flag '{}' on /{}/", other, source),
                    ))
                }
            };
        }
        let regex = builder.build().map_err(|e| {
            ProjectError::schema(
                error_codes::INVALID_PATTERN,
                format!("Invalid pattern /{}/: {}", source, e),
            )
        })?;

        Ok(Self {
            source: source.to_string(),
            flags: flags.to_string(),
            regex,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }
}

impl PartialEq for PatternRule {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.flags == other.flags
    }
}

impl fmt::Display for PatternRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

/// **ATOMIC RULE**
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Required,
    Optional { default: Option<JsonValue> },
    Type(ValueType),
    IntegerOnly,
    /// Inclusive on both ends.
    Range { min: Option<f64>, max: Option<f64> },
    /// Character count, inclusive.
    Length { min: Option<usize>, max: Option<usize> },
    Enum(Vec<JsonValue>),
    Pattern(PatternRule),
    AllowEmptyString,
}

impl Constraint {
    pub fn name(&self) -> &'static str {
        match self {
            Constraint::Required => "required",
            Constraint::Optional { .. } => "optional",
            Constraint::Type(_) => "type",
            Constraint::IntegerOnly => "integer",
            Constraint::Range { .. } => "range",
            Constraint::Length { .. } => "length",
            Constraint::Enum(_) => "enum",
            Constraint::Pattern(_) => "pattern",
            Constraint::AllowEmptyString => "allow_empty_string",
        }
    }

    pub fn is_refinement(&self) -> bool {
        matches!(
            self,
            Constraint::IntegerOnly
                | Constraint::Range { .. }
                | Constraint::Length { .. }
                | Constraint::Enum(_)
                | Constraint::Pattern(_)
        )
    }

    /// Checks a refinement against an already type-checked value.
    /// Presence and type constraints always pass here.
    pub fn check(&self, value: &JsonValue) -> Option<(ViolationKind, ViolationDetail)> {
        match self {
            Constraint::IntegerOnly => {
                let number = value.as_f64()?;
                if number.fract() != 0.0 {
                    return Some((
                        ViolationKind::IntegerViolation,
                        ViolationDetail::ExpectedType(ValueType::Number),
                    ));
                }
                None
            }
            Constraint::Range { min, max } => {
                let number = value.as_f64()?;
                if let Some(min) = min {
                    if number < *min {
                        return Some((
                            ViolationKind::OutOfRange,
                            ViolationDetail::BelowMin(format_number(*min)),
                        ));
                    }
                }
                if let Some(max) = max {
                    if number > *max {
                        return Some((
                            ViolationKind::OutOfRange,
                            ViolationDetail::AboveMax(format_number(*max)),
                        ));
                    }
                }
                None
            }
            Constraint::Length { min, max } => {
                let length = value.as_str()?.chars().count();
                if let Some(min) = min {
                    if length < *min {
                        return Some((
                            ViolationKind::LengthViolation,
                            ViolationDetail::BelowMin(min.to_string()),
                        ));
                    }
                }
                if let Some(max) = max {
                    if length > *max {
                        return Some((
                            ViolationKind::LengthViolation,
                            ViolationDetail::AboveMax(max.to_string()),
                        ));
                    }
                }
                None
            }
            Constraint::Enum(allowed) => {
                if allowed.iter().any(|literal| literal_eq(literal, value)) {
                    None
                } else {
                    Some((
                        ViolationKind::EnumViolation,
                        ViolationDetail::Allowed(allowed.clone()),
                    ))
                }
            }
            Constraint::Pattern(rule) => {
                let candidate = value.as_str()?;
                if rule.is_match(candidate) {
                    None
                } else {
                    Some((
                        ViolationKind::PatternMismatch,
                        ViolationDetail::Pattern(rule.to_string()),
                    ))
                }
            }
            Constraint::Required
            | Constraint::Optional { .. }
            | Constraint::Type(_)
            | Constraint::AllowEmptyString => None,
        }
    }
}
