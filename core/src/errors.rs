use thiserror::Error;

/// Faults that are not client input problems: bad schema authoring, bad
/// registry wiring, bad configuration, or raw bytes that cannot become buckets.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("SCHEMA ERROR: {code} - {message}")]
    Schema { code: String, message: String },

    #[error("REGISTRY ERROR: {code} - {message}")]
    Registry { code: String, message: String },

    #[error("REQUEST ERROR: {code} - {message}")]
    Request { code: String, message: String },

    #[error("CONFIG ERROR: {code} - {message}")]
    Config { code: String, message: String },
}

impl ProjectError {
    pub(crate) fn schema(code: &str, message: impl Into<String>) -> Self {
        ProjectError::Schema {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn registry(code: &str, message: impl Into<String>) -> Self {
        ProjectError::Registry {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn request(code: &str, message: impl Into<String>) -> Self {
        ProjectError::Request {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn config(code: &str, message: impl Into<String>) -> Self {
        ProjectError::Config {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            ProjectError::Schema { code, .. }
            | ProjectError::Registry { code, .. }
            | ProjectError::Request { code, .. }
            | ProjectError::Config { code, .. } => code,
        }
    }
}

/// **ERROR CODES**
///
/// **MANDATE**: Use these standardized codes for consistent error reporting.
pub mod error_codes {
    // Request-time violations
    pub const MISSING_REQUIRED_FIELD: &str = "REQGUARD_VALIDATION_MISSING_REQUIRED_FIELD";
    pub const TYPE_MISMATCH: &str = "REQGUARD_VALIDATION_TYPE_MISMATCH";
    pub const INTEGER_VIOLATION: &str = "REQGUARD_VALIDATION_INTEGER_VIOLATION";
    pub const OUT_OF_RANGE: &str = "REQGUARD_VALIDATION_OUT_OF_RANGE";
    pub const LENGTH_VIOLATION: &str = "REQGUARD_VALIDATION_LENGTH_VIOLATION";
    pub const ENUM_VIOLATION: &str = "REQGUARD_VALIDATION_ENUM_VIOLATION";
    pub const PATTERN_MISMATCH: &str = "REQGUARD_VALIDATION_PATTERN_MISMATCH";
    pub const KEY_VALIDATION_FAILURE: &str = "REQGUARD_VALIDATION_KEY_VALIDATION_FAILURE";
    pub const NO_RECOGNIZED_FIELDS: &str = "REQGUARD_VALIDATION_NO_RECOGNIZED_FIELDS";
    pub const ARRAY_SIZE_VIOLATION: &str = "REQGUARD_VALIDATION_ARRAY_SIZE_VIOLATION";
    pub const UNKNOWN_FIELD: &str = "REQGUARD_VALIDATION_UNKNOWN_FIELD";

    // Schema authoring
    pub const INCONSISTENT_CONSTRAINT: &str = "REQGUARD_SCHEMA_INCONSISTENT_CONSTRAINT";
    pub const INVALID_DEFAULT: &str = "REQGUARD_SCHEMA_INVALID_DEFAULT";
    pub const INVALID_PATTERN: &str = "REQGUARD_SCHEMA_INVALID_PATTERN";
    pub const DUPLICATE_FIELD: &str = "REQGUARD_SCHEMA_DUPLICATE_FIELD";

    // Registry wiring
    pub const DUPLICATE_ENDPOINT: &str = "REQGUARD_REGISTRY_DUPLICATE_ENDPOINT";
    pub const INVALID_ROUTE_PATTERN: &str = "REQGUARD_REGISTRY_INVALID_ROUTE_PATTERN";
    pub const INVALID_HTTP_METHOD: &str = "REQGUARD_REGISTRY_INVALID_HTTP_METHOD";

    // Raw request parsing
    pub const BODY_TOO_LARGE: &str = "REQGUARD_REQUEST_BODY_TOO_LARGE";
    pub const INVALID_UTF8: &str = "REQGUARD_REQUEST_INVALID_UTF8";
    pub const INVALID_JSON: &str = "REQGUARD_REQUEST_INVALID_JSON";

    // Configuration
    pub const INVALID_CONFIG: &str = "REQGUARD_CONFIG_INVALID";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_and_code() {
        let err = ProjectError::schema(error_codes::INVALID_PATTERN, "bad regex");
        assert_eq!(err.code(), error_codes::INVALID_PATTERN);
        assert_eq!(
            err.to_string(),
            "SCHEMA ERROR: REQGUARD_SCHEMA_INVALID_PATTERN - bad regex"
        );
    }

    #[test]
    fn test_error_codes_exist() {
        assert!(!error_codes::MISSING_REQUIRED_FIELD.is_empty());
        assert!(!error_codes::DUPLICATE_ENDPOINT.is_empty());
        assert!(!error_codes::BODY_TOO_LARGE.is_empty());
    }
}
