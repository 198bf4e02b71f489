//! # ENGINE CONFIGURATION
//!
//! **PURPOSE**: Runtime knobs shared by every validation.
//! **USAGE**: Build once at startup (in code or from JSON), hand to
//! [`ValidationEngine::new`](crate::validation::ValidationEngine::new).

use crate::errors::{error_codes, ProjectError};
use crate::validation::{MessageTemplates, UnknownKeys};
use serde::{Deserialize, Serialize};

/// 10MB default body limit
pub const DEFAULT_MAX_BODY_BYTES: usize = 10_485_760;

/// **VALIDATION CONTEXT**
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationContext {
    /// **CONVERT** - Parse numeric and boolean strings where the schema asks for those types
    pub convert: bool,

    /// **UNKNOWN KEYS** - Policy for objects that do not declare their own
    pub unknown_keys: UnknownKeys,

    /// **MAXIMUM BODY SIZE** - Limit for raw request bodies, in bytes
    pub max_body_bytes: usize,

    /// **MESSAGE TEMPLATES** - Generic messages used when a node has no override
    pub templates: MessageTemplates,
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self {
            convert: true,
            unknown_keys: UnknownKeys::Allow,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            templates: MessageTemplates::default(),
        }
    }
}

impl ValidationContext {
    /// Loads a context from JSON; omitted keys keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self, ProjectError> {
        serde_json::from_str(raw).map_err(|e| {
            ProjectError::config(
                error_codes::INVALID_CONFIG,
                format!("Invalid validation config: {}", e),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_context_default() {
        let ctx = ValidationContext::default();
        assert!(ctx.convert);
        assert_eq!(ctx.unknown_keys, UnknownKeys::Allow);
        assert_eq!(ctx.max_body_bytes, 10_485_760);
    }

    #[test]
    fn test_validation_context_partial_json() {
        let ctx = ValidationContext::from_json(
            r#"{"unknown_keys": "strip", "templates": {"required": "{label} is mandatory"}}"#,
        )
        .unwrap();
        assert!(ctx.convert);
        assert_eq!(ctx.unknown_keys, UnknownKeys::Strip);
        assert_eq!(ctx.templates.required, "{label} is mandatory");
        assert_eq!(
            ctx.templates.integer,
            MessageTemplates::default().integer
        );
    }

    #[test]
    fn test_validation_context_bad_json() {
        let err = ValidationContext::from_json(r#"{"unknown_keys": "maybe"}"#).unwrap_err();
        assert_eq!(err.code(), error_codes::INVALID_CONFIG);
    }
}
