//! # MESSAGE RESOLVER
//!
//! **PURPOSE**: Turns a `(kind, detail, label)` triple into human-readable text.
//! **ORDER**: per-node override for the violation kind, then the generic template.
//!
//! Both overrides and templates may use the placeholders `{label}`, `{limit}`,
//! `{min}`, `{max}`, `{valids}`, `{pattern}`, `{type}` and `{key}`.

use super::violation::{ViolationDetail, ViolationKind};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Per-node message overrides, attached at schema authoring time.
pub type MessageOverrides = HashMap<ViolationKind, String>;

/// **GENERIC TEMPLATES**
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageTemplates {
    pub required: String,
    pub empty: String,
    pub type_mismatch: String,
    pub integer: String,
    pub range_min: String,
    pub range_max: String,
    pub length_min: String,
    pub length_max: String,
    pub enum_values: String,
    pub pattern: String,
    pub invalid_key: String,
    pub no_recognized_fields: String,
    pub array_min: String,
    pub array_max: String,
    pub unknown_field: String,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            required: "\"{label}\" is required".to_string(),
            empty: "\"{label}\" is not allowed to be empty".to_string(),
            type_mismatch: "\"{label}\" must be of type {type}".to_string(),
            integer: "\"{label}\" must be an integer".to_string(),
            range_min: "\"{label}\" must be greater than or equal to {limit}".to_string(),
            range_max: "\"{label}\" must be less than or equal to {limit}".to_string(),
            length_min: "\"{label}\" length must be at least {limit} characters long"
                .to_string(),
            length_max:
                "\"{label}\" length must be less than or equal to {limit} characters long"
                    .to_string(),
            enum_values: "\"{label}\" must be one of [{valids}]".to_string(),
            pattern: "\"{label}\" fails to match the required pattern: {pattern}".to_string(),
            invalid_key: "\"{label}\" is not an allowed key".to_string(),
            no_recognized_fields: "\"{label}\": no recognized fields supplied".to_string(),
            array_min: "\"{label}\" must contain at least {limit} items".to_string(),
            array_max: "\"{label}\" must contain less than or equal to {limit} items"
                .to_string(),
            unknown_field: "\"{label}\" is not allowed".to_string(),
        }
    }
}

impl MessageTemplates {
    fn select(&self, kind: ViolationKind, detail: &ViolationDetail) -> &str {
        let below = matches!(detail, ViolationDetail::BelowMin(_));
        match kind {
            ViolationKind::MissingRequiredField if *detail == ViolationDetail::Empty => {
                &self.empty
            }
            ViolationKind::MissingRequiredField => &self.required,
            ViolationKind::TypeMismatch => &self.type_mismatch,
            ViolationKind::IntegerViolation => &self.integer,
            ViolationKind::OutOfRange if below => &self.range_min,
            ViolationKind::OutOfRange => &self.range_max,
            ViolationKind::LengthViolation if below => &self.length_min,
            ViolationKind::LengthViolation => &self.length_max,
            ViolationKind::EnumViolation => &self.enum_values,
            ViolationKind::PatternMismatch => &self.pattern,
            ViolationKind::KeyValidationFailure => &self.invalid_key,
            ViolationKind::NoRecognizedFieldsSupplied => &self.no_recognized_fields,
            ViolationKind::ArraySizeViolation if below => &self.array_min,
            ViolationKind::ArraySizeViolation => &self.array_max,
            ViolationKind::UnknownField => &self.unknown_field,
        }
    }
}

/// **STATIC LOOKUP** - no per-request state
#[derive(Debug, Clone, Default)]
pub struct MessageResolver {
    templates: MessageTemplates,
}

impl MessageResolver {
    pub fn new(templates: MessageTemplates) -> Self {
        Self { templates }
    }

    pub fn templates(&self) -> &MessageTemplates {
        &self.templates
    }

    pub fn resolve(
        &self,
        overrides: &MessageOverrides,
        kind: ViolationKind,
        detail: &ViolationDetail,
        label: &str,
    ) -> String {
        let template = overrides
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| self.templates.select(kind, detail));
        interpolate(template, detail, label)
    }
}

fn interpolate(template: &str, detail: &ViolationDetail, label: &str) -> String {
    let mut message = template.replace("{label}", label);
    match detail {
        ViolationDetail::BelowMin(limit) => {
            message = message.replace("{limit}", limit).replace("{min}", limit);
        }
        ViolationDetail::AboveMax(limit) => {
            message = message.replace("{limit}", limit).replace("{max}", limit);
        }
        ViolationDetail::TooFewKeys(count) => {
            message = message.replace("{limit}", &count.to_string());
        }
        ViolationDetail::ExpectedType(expected) => {
            message = message.replace("{type}", expected.as_str());
        }
        ViolationDetail::Allowed(valids) => {
            message = message.replace("{valids}", &format_valids(valids));
        }
        ViolationDetail::Pattern(pattern) => {
            message = message.replace("{pattern}", pattern);
        }
        ViolationDetail::InvalidKey(key) => {
            message = message.replace("{key}", key);
        }
        ViolationDetail::Missing | ViolationDetail::Empty => {}
    }
    message
}

fn format_valids(valids: &[JsonValue]) -> String {
    valids
        .iter()
        .map(|literal| match literal {
            JsonValue::String(text) => text.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::constraint::ValueType;
    use serde_json::json;

    #[test]
    fn test_generic_templates() {
        let resolver = MessageResolver::default();
        let none = MessageOverrides::new();

        assert_eq!(
            resolver.resolve(
                &none,
                ViolationKind::MissingRequiredField,
                &ViolationDetail::Missing,
                "name"
            ),
            "\"name\" is required"
        );
        assert_eq!(
            resolver.resolve(
                &none,
                ViolationKind::MissingRequiredField,
                &ViolationDetail::Empty,
                "reason"
            ),
            "\"reason\" is not allowed to be empty"
        );
        assert_eq!(
            resolver.resolve(
                &none,
                ViolationKind::OutOfRange,
                &ViolationDetail::AboveMax("100".to_string()),
                "grades[0].grade"
            ),
            "\"grades[0].grade\" must be less than or equal to 100"
        );
        assert_eq!(
            resolver.resolve(
                &none,
                ViolationKind::TypeMismatch,
                &ViolationDetail::ExpectedType(ValueType::Number),
                "page"
            ),
            "\"page\" must be of type number"
        );
    }

    #[test]
    fn test_enum_valids_listed() {
        let resolver = MessageResolver::default();
        let message = resolver.resolve(
            &MessageOverrides::new(),
            ViolationKind::EnumViolation,
            &ViolationDetail::Allowed(vec![json!("csv"), json!("xlsx")]),
            "format",
        );
        assert_eq!(message, "\"format\" must be one of [csv, xlsx]");
    }

    #[test]
    fn test_override_wins_and_interpolates() {
        let resolver = MessageResolver::default();
        let mut overrides = MessageOverrides::new();
        overrides.insert(
            ViolationKind::OutOfRange,
            "Grade for {label} must not exceed {max} points".to_string(),
        );

        let message = resolver.resolve(
            &overrides,
            ViolationKind::OutOfRange,
            &ViolationDetail::AboveMax("100".to_string()),
            "grade",
        );
        assert_eq!(message, "Grade for grade must not exceed 100 points");

        // other kinds on the same node still use the generic template
        let fallback = resolver.resolve(
            &overrides,
            ViolationKind::MissingRequiredField,
            &ViolationDetail::Missing,
            "grade",
        );
        assert_eq!(fallback, "\"grade\" is required");
    }

    #[test]
    fn test_templates_deserialize_partially() {
        let templates: MessageTemplates =
            serde_json::from_value(json!({"required": "{label} missing"})).unwrap();
        assert_eq!(templates.required, "{label} missing");
        assert_eq!(templates.integer, MessageTemplates::default().integer);
    }
}
