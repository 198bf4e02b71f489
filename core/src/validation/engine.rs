//! # VALIDATION ENGINE
//!
//! **PURPOSE**: Single interpreter for every schema tree.
//! **GUARANTEE**: Pure and synchronous. Never aborts on bad input; violations
//! accumulate depth-first in field declaration order so identical input always
//! yields an identical report.

use super::constraint::ValueType;
use super::messages::{MessageOverrides, MessageResolver};
use super::path::FieldPath;
use super::schema::{SchemaNode, Shape, UnknownKeys};
use super::violation::{ValidationErrors, Violation, ViolationDetail, ViolationKind};
use crate::config::ValidationContext;
use crate::registry::{Bucket, SchemaBundle};
use crate::request::{RequestBuckets, ValidatedRequest};
use once_cell::sync::Lazy;
use serde_json::{Map, Value as JsonValue};

static SHARED_ENGINE: Lazy<ValidationEngine> = Lazy::new(ValidationEngine::default);

/// Label used in messages for a violation at the root of a standalone value.
const ROOT_LABEL: &str = "value";

#[derive(Debug, Clone)]
pub struct ValidationEngine {
    context: ValidationContext,
    resolver: MessageResolver,
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new(ValidationContext::default())
    }
}

impl ValidationEngine {
    pub fn new(context: ValidationContext) -> Self {
        let resolver = MessageResolver::new(context.templates.clone());
        Self { context, resolver }
    }

    /// Process-wide engine with the default context.
    pub fn shared() -> &'static ValidationEngine {
        &SHARED_ENGINE
    }

    pub fn context(&self) -> &ValidationContext {
        &self.context
    }

    /// Validates a value that is known to be present.
    pub fn validate_value(
        &self,
        node: &SchemaNode,
        value: JsonValue,
    ) -> Result<JsonValue, ValidationErrors> {
        let mut pass = Pass::new(self, ROOT_LABEL, self.context.convert);
        let normalized = pass.evaluate(node, Some(&value), &FieldPath::root());
        pass.errors
            .into_result(normalized.unwrap_or(JsonValue::Null))
    }

    /// Validates a possibly absent value; `Ok(None)` means absent and optional
    /// with no default.
    pub fn validate_optional(
        &self,
        node: &SchemaNode,
        value: Option<&JsonValue>,
        root_label: &str,
    ) -> Result<Option<JsonValue>, ValidationErrors> {
        let mut pass = Pass::new(self, root_label, self.context.convert);
        let normalized = pass.evaluate(node, value, &FieldPath::root());
        pass.errors.into_result(normalized)
    }

    /// Runs every declared bucket in `params`, `query`, `body` order.
    /// Undeclared buckets pass through untouched and are never reported.
    pub fn validate(
        &self,
        bundle: &SchemaBundle,
        request: RequestBuckets,
    ) -> Result<ValidatedRequest, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut validated = ValidatedRequest::from(request);

        for bucket in Bucket::ALL {
            let Some(node) = bundle.node(bucket) else {
                continue;
            };
            log::trace!("validating {} bucket", bucket);
            let input = validated.take(bucket);
            match self.validate_optional(node, input.as_ref(), bucket.as_str()) {
                Ok(normalized) => validated.set(bucket, normalized),
                Err(mut bucket_errors) => {
                    bucket_errors.tag_bucket(bucket);
                    errors.extend(bucket_errors);
                }
            }
        }

        if !errors.is_empty() {
            log::debug!(
                "request validation failed with {} violation(s), first at '{}'",
                errors.len(),
                errors.violations[0].location()
            );
        }
        errors.into_result(validated)
    }
}

/// State of one evaluation; created per call and discarded afterwards.
struct Pass<'e> {
    engine: &'e ValidationEngine,
    root_label: &'e str,
    convert: bool,
    errors: ValidationErrors,
}

impl<'e> Pass<'e> {
    fn new(engine: &'e ValidationEngine, root_label: &'e str, convert: bool) -> Self {
        Self {
            engine,
            root_label,
            convert,
            errors: ValidationErrors::new(),
        }
    }

    fn label(&self, node: &SchemaNode, path: &FieldPath) -> String {
        match node.label() {
            Some(label) => label.to_string(),
            None if path.is_root() => self.root_label.to_string(),
            None => path.to_string(),
        }
    }

    fn report(
        &mut self,
        node: &SchemaNode,
        overrides: &MessageOverrides,
        path: &FieldPath,
        kind: ViolationKind,
        detail: ViolationDetail,
    ) {
        let label = self.label(node, path);
        let message = self
            .engine
            .resolver
            .resolve(overrides, kind, &detail, &label);
        self.errors.push(Violation {
            bucket: None,
            path: path.clone(),
            kind,
            message,
            detail,
        });
    }

    /// Returns the normalized value, or `None` when the value is absent from
    /// the output (optional without default, or rejected outright).
    fn evaluate(
        &mut self,
        node: &SchemaNode,
        candidate: Option<&JsonValue>,
        path: &FieldPath,
    ) -> Option<JsonValue> {
        // presence
        let Some(value) = candidate else {
            if node.is_required() {
                self.report(
                    node,
                    node.messages(),
                    path,
                    ViolationKind::MissingRequiredField,
                    ViolationDetail::Missing,
                );
                return None;
            }
            let default = node.default_value()?.clone();
            return self.evaluate_present(node, &default, path);
        };
        self.evaluate_present(node, value, path)
    }

    fn evaluate_present(
        &mut self,
        node: &SchemaNode,
        value: &JsonValue,
        path: &FieldPath,
    ) -> Option<JsonValue> {
        let value_type = node.value_type();

        if value_type == Some(ValueType::String)
            && value.as_str() == Some("")
            && !node.allows_empty_string()
        {
            let detail = if node.is_required() {
                ViolationDetail::Missing
            } else {
                ViolationDetail::Empty
            };
            self.report(
                node,
                node.messages(),
                path,
                ViolationKind::MissingRequiredField,
                detail,
            );
            return None;
        }

        // type
        let value = match value_type {
            Some(expected) => match expected.coerce(value, self.convert) {
                Some(coerced) => coerced,
                None => {
                    self.report(
                        node,
                        node.messages(),
                        path,
                        ViolationKind::TypeMismatch,
                        ViolationDetail::ExpectedType(expected),
                    );
                    return None;
                }
            },
            None => value.clone(),
        };

        // refinements
        for constraint in node.refinements() {
            if let Some((kind, detail)) = constraint.check(&value) {
                self.report(node, node.messages(), path, kind, detail);
            }
        }

        match node.shape() {
            Shape::Scalar => Some(value),
            Shape::Object {
                fields,
                min_present_keys,
                unknown_keys,
            } => {
                let JsonValue::Object(map) = value else {
                    return None;
                };
                let policy = unknown_keys.unwrap_or(self.engine.context.unknown_keys);
                Some(self.evaluate_object(node, fields, *min_present_keys, policy, map, path))
            }
            Shape::Array {
                element,
                min_items,
                max_items,
            } => {
                let JsonValue::Array(items) = value else {
                    return None;
                };
                Some(self.evaluate_array(node, element, *min_items, *max_items, items, path))
            }
            Shape::PatternMap { key, value: entry } => {
                let JsonValue::Object(map) = value else {
                    return None;
                };
                Some(self.evaluate_pattern_map(node, key, entry, map, path))
            }
        }
    }

    fn evaluate_object(
        &mut self,
        node: &SchemaNode,
        fields: &[(String, SchemaNode)],
        min_present_keys: Option<usize>,
        policy: UnknownKeys,
        map: Map<String, JsonValue>,
        path: &FieldPath,
    ) -> JsonValue {
        let mut normalized = Map::new();
        let mut missing_reported = false;

        for (name, child) in fields {
            let child_path = path.child_key(name.as_str());
            missing_reported |= child.is_required() && !map.contains_key(name);
            if let Some(value) = self.evaluate(child, map.get(name), &child_path) {
                normalized.insert(name.clone(), value);
            }
        }

        let declared = |key: &str| fields.iter().any(|(name, _)| name == key);
        for (key, value) in &map {
            if declared(key) {
                continue;
            }
            match policy {
                UnknownKeys::Allow => {
                    normalized.insert(key.clone(), value.clone());
                }
                UnknownKeys::Strip => {}
                UnknownKeys::Reject => {
                    let unknown_path = path.child_key(key.as_str());
                    self.report(
                        node,
                        node.messages(),
                        &unknown_path,
                        ViolationKind::UnknownField,
                        ViolationDetail::InvalidKey(key.clone()),
                    );
                }
            }
        }

        // a missing required field already says the object is short of keys
        if let Some(required) = min_present_keys.filter(|_| !missing_reported) {
            let present = fields
                .iter()
                .filter(|(name, _)| map.contains_key(name))
                .count();
            if present < required {
                self.report(
                    node,
                    node.messages(),
                    path,
                    ViolationKind::NoRecognizedFieldsSupplied,
                    ViolationDetail::TooFewKeys(required),
                );
            }
        }

        JsonValue::Object(normalized)
    }

    fn evaluate_array(
        &mut self,
        node: &SchemaNode,
        element: &SchemaNode,
        min_items: Option<usize>,
        max_items: Option<usize>,
        items: Vec<JsonValue>,
        path: &FieldPath,
    ) -> JsonValue {
        if let Some(min) = min_items {
            if items.len() < min {
                self.report(
                    node,
                    node.messages(),
                    path,
                    ViolationKind::ArraySizeViolation,
                    ViolationDetail::BelowMin(min.to_string()),
                );
            }
        }
        if let Some(max) = max_items {
            if items.len() > max {
                self.report(
                    node,
                    node.messages(),
                    path,
                    ViolationKind::ArraySizeViolation,
                    ViolationDetail::AboveMax(max.to_string()),
                );
            }
        }

        // every element, no short-circuit across indices
        let normalized = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                self.evaluate(element, Some(item), &path.child_index(index))
                    .unwrap_or(JsonValue::Null)
            })
            .collect();
        JsonValue::Array(normalized)
    }

    fn evaluate_pattern_map(
        &mut self,
        node: &SchemaNode,
        key_node: &SchemaNode,
        value_node: &SchemaNode,
        map: Map<String, JsonValue>,
        path: &FieldPath,
    ) -> JsonValue {
        let mut normalized = Map::new();

        for (key, value) in map {
            let entry_path = path.child_key(key.as_str());
            if !self.key_is_valid(key_node, &key, &entry_path) {
                let overrides = if key_node
                    .messages()
                    .contains_key(&ViolationKind::KeyValidationFailure)
                {
                    key_node.messages()
                } else {
                    node.messages()
                };
                self.report(
                    node,
                    overrides,
                    &entry_path,
                    ViolationKind::KeyValidationFailure,
                    ViolationDetail::InvalidKey(key),
                );
                continue;
            }
            if let Some(value) = self.evaluate(value_node, Some(&value), &entry_path) {
                normalized.insert(key, value);
            }
        }

        JsonValue::Object(normalized)
    }

    /// Keys always arrive as strings, so conversion is forced on for them.
    fn key_is_valid(&self, key_node: &SchemaNode, key: &str, path: &FieldPath) -> bool {
        let mut probe = Pass::new(self.engine, self.root_label, true);
        let candidate = JsonValue::String(key.to_string());
        probe.evaluate(key_node, Some(&candidate), path);
        probe.errors.is_empty()
    }
}
