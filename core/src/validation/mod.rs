//! # REQGUARD VALIDATION MODULE
//!
//! **DECLARATIVE SCHEMAS EVALUATED BY A SINGLE INTERPRETER**
//!
//! Schemas are plain data ([`SchemaNode`]) assembled with [`NodeBuilder`] and
//! checked once at build time. [`ValidationEngine`] walks a node against an
//! untyped `serde_json::Value` and returns either the normalized value or the
//! full ordered list of [`Violation`]s.
//!
//! ## EVALUATION ORDER
//!
//! 1. **PRESENCE** - required / optional / default injection
//! 2. **TYPE** - with string conversion when enabled
//! 3. **REFINEMENTS** - integer, range, length, enum, pattern
//! 4. **COMPOSITES** - object fields, array elements, pattern-map entries
//!
//! ## USAGE
//!
//! ```rust
//! use reqguard::validation::{NodeBuilder, Validator};
//! use serde_json::json;
//!
//! let schema = NodeBuilder::object()
//!     .field("grade", NodeBuilder::number().required().range(0.0, 100.0))
//!     .build()?;
//! let errors = schema.validate(json!({"grade": 150})).unwrap_err();
//! assert_eq!(errors.violations[0].path.to_string(), "grade");
//! # Ok::<(), reqguard::errors::ProjectError>(())
//! ```

use crate::registry::SchemaBundle;
use crate::request::{RequestBuckets, ValidatedRequest};
use serde_json::Value as JsonValue;

pub mod constraint;
pub mod engine;
pub mod messages;
pub mod path;
pub mod schema;
pub mod violation;

pub use constraint::{Constraint, PatternRule, ValueType};
pub use engine::ValidationEngine;
pub use messages::{MessageOverrides, MessageResolver, MessageTemplates};
pub use path::{FieldPath, PathSegment};
pub use schema::{NodeBuilder, SchemaNode, Shape, UnknownKeys};
pub use violation::{ValidationErrors, Violation, ViolationDetail, ViolationKind};

/// **CORE VALIDATOR TRAIT**
///
/// **GUARANTEE**: MUST NOT panic. Every client-input problem comes back as a
/// [`Violation`] inside [`ValidationErrors`].
pub trait Validator {
    /// **INPUT TYPE** - Untyped data accepted by this validator
    type Input;

    /// **OUTPUT TYPE** - Normalized data returned on success
    type Output;

    fn validate(&self, input: Self::Input) -> Result<Self::Output, ValidationErrors>;
}

/// **VALIDATION RESULT TYPE ALIASES**
pub type ValidationResult<T> = Result<T, ValidationErrors>;
pub type ValueResult = ValidationResult<JsonValue>;
pub type RequestResult = ValidationResult<ValidatedRequest>;

impl Validator for SchemaNode {
    type Input = JsonValue;
    type Output = JsonValue;

    fn validate(&self, input: Self::Input) -> ValueResult {
        ValidationEngine::shared().validate_value(self, input)
    }
}

impl Validator for SchemaBundle {
    type Input = RequestBuckets;
    type Output = ValidatedRequest;

    fn validate(&self, input: Self::Input) -> RequestResult {
        ValidationEngine::shared().validate(self, input)
    }
}
