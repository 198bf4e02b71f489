//! # SCHEMA NODES
//!
//! **PURPOSE**: Declarative description of one value, as data.
//! **LIFECYCLE**: authored through [`NodeBuilder`], checked once by
//! [`NodeBuilder::build`], then shared immutably across every request.
//!
//! ```rust
//! use reqguard::validation::NodeBuilder;
//!
//! let grade = NodeBuilder::object()
//!     .field("submission_id", NodeBuilder::integer().required().min(1.0))
//!     .field("grade", NodeBuilder::number().required().range(0.0, 100.0))
//!     .field("feedback", NodeBuilder::string().allow_empty())
//!     .build()
//!     .unwrap();
//! # let _ = grade;
//! ```

use super::constraint::{Constraint, PatternRule, ValueType};
use super::engine::ValidationEngine;
use super::messages::MessageOverrides;
use super::path::FieldPath;
use super::violation::ViolationKind;
use crate::config::ValidationContext;
use crate::errors::{error_codes, ProjectError};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashSet;

/// **UNKNOWN KEY POLICY** for objects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownKeys {
    /// Keep undeclared keys in the normalized output.
    #[default]
    Allow,
    /// Drop undeclared keys from the normalized output.
    Strip,
    /// Report each undeclared key as `UnknownField`.
    Reject,
}

/// Structural part of a node.
#[derive(Debug, Clone)]
pub enum Shape {
    Scalar,
    Object {
        fields: Vec<(String, SchemaNode)>,
        min_present_keys: Option<usize>,
        unknown_keys: Option<UnknownKeys>,
    },
    Array {
        element: Box<SchemaNode>,
        min_items: Option<usize>,
        max_items: Option<usize>,
    },
    PatternMap {
        key: Box<SchemaNode>,
        value: Box<SchemaNode>,
    },
}

/// **IMMUTABLE SCHEMA NODE**
#[derive(Debug, Clone)]
pub struct SchemaNode {
    shape: Shape,
    constraints: Vec<Constraint>,
    messages: MessageOverrides,
    label: Option<String>,
}

impl SchemaNode {
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn messages(&self) -> &MessageOverrides {
        &self.messages
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn is_required(&self) -> bool {
        self.constraints.contains(&Constraint::Required)
    }

    pub fn default_value(&self) -> Option<&JsonValue> {
        self.constraints.iter().find_map(|constraint| match constraint {
            Constraint::Optional { default } => default.as_ref(),
            _ => None,
        })
    }

    pub fn value_type(&self) -> Option<ValueType> {
        declared_type(&self.constraints)
    }

    pub fn allows_empty_string(&self) -> bool {
        self.constraints.contains(&Constraint::AllowEmptyString)
    }

    pub fn refinements(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter().filter(|c| c.is_refinement())
    }
}

fn declared_type(constraints: &[Constraint]) -> Option<ValueType> {
    constraints.iter().find_map(|constraint| match constraint {
        Constraint::Type(value_type) => Some(*value_type),
        _ => None,
    })
}

#[derive(Debug, Clone)]
enum ShapeBuilder {
    Scalar,
    Object {
        fields: Vec<(String, NodeBuilder)>,
        min_present_keys: Option<usize>,
        unknown_keys: Option<UnknownKeys>,
    },
    Array {
        element: Box<NodeBuilder>,
        min_items: Option<usize>,
        max_items: Option<usize>,
    },
    PatternMap {
        key: Box<NodeBuilder>,
        value: Box<NodeBuilder>,
    },
}

/// **SCHEMA AUTHORING BUILDER**
///
/// Modifiers never fail on their own; every inconsistency is reported by
/// [`NodeBuilder::build`] together with the schema path it was found at.
#[derive(Debug, Clone)]
pub struct NodeBuilder {
    shape: ShapeBuilder,
    constraints: Vec<Constraint>,
    messages: MessageOverrides,
    label: Option<String>,
    error: Option<(&'static str, String)>,
}

impl NodeBuilder {
    fn with_shape(shape: ShapeBuilder, value_type: Option<ValueType>) -> Self {
        Self {
            shape,
            constraints: value_type.map(Constraint::Type).into_iter().collect(),
            messages: MessageOverrides::new(),
            label: None,
            error: None,
        }
    }

    pub fn number() -> Self {
        Self::with_shape(ShapeBuilder::Scalar, Some(ValueType::Number))
    }

    /// Number restricted to integral values.
    pub fn integer() -> Self {
        Self::number().refine(Constraint::IntegerOnly)
    }

    pub fn string() -> Self {
        Self::with_shape(ShapeBuilder::Scalar, Some(ValueType::String))
    }

    pub fn boolean() -> Self {
        Self::with_shape(ShapeBuilder::Scalar, Some(ValueType::Boolean))
    }

    /// Scalar with no type constraint; only presence and enum apply.
    pub fn any() -> Self {
        Self::with_shape(ShapeBuilder::Scalar, None)
    }

    pub fn object() -> Self {
        Self::with_shape(
            ShapeBuilder::Object {
                fields: Vec::new(),
                min_present_keys: None,
                unknown_keys: None,
            },
            Some(ValueType::Object),
        )
    }

    pub fn array(element: NodeBuilder) -> Self {
        Self::with_shape(
            ShapeBuilder::Array {
                element: Box::new(element),
                min_items: None,
                max_items: None,
            },
            Some(ValueType::Array),
        )
    }

    /// Object with dynamic keys: every key is checked against the scalar `key`
    /// schema (as a string, with conversion), every value against `value`.
    pub fn pattern_map(key: NodeBuilder, value: NodeBuilder) -> Self {
        Self::with_shape(
            ShapeBuilder::PatternMap {
                key: Box::new(key),
                value: Box::new(value),
            },
            Some(ValueType::Object),
        )
    }

    /// Key schema accepting strings that match `pattern`.
    pub fn key_pattern(pattern: &str) -> Self {
        Self::string().pattern(pattern)
    }

    /// Raw constraint escape hatch; the usual modifiers below are preferred.
    pub fn constraint(self, constraint: Constraint) -> Self {
        match constraint {
            Constraint::Required | Constraint::Optional { .. } => self.presence(constraint),
            other => self.refine(other),
        }
    }

    fn fail(&mut self, code: &'static str, reason: String) {
        self.error.get_or_insert((code, reason));
    }

    fn refine(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    fn presence(mut self, presence: Constraint) -> Self {
        self.constraints
            .retain(|c| !matches!(c, Constraint::Required | Constraint::Optional { .. }));
        self.constraints.insert(0, presence);
        self
    }

    // **PRESENCE**

    pub fn required(self) -> Self {
        self.presence(Constraint::Required)
    }

    pub fn optional(self) -> Self {
        self.presence(Constraint::Optional { default: None })
    }

    /// Optional with a value injected when the key is absent.
    pub fn default(self, value: impl Into<JsonValue>) -> Self {
        self.presence(Constraint::Optional {
            default: Some(value.into()),
        })
    }

    pub fn allow_empty(self) -> Self {
        if self.constraints.contains(&Constraint::AllowEmptyString) {
            return self;
        }
        self.refine(Constraint::AllowEmptyString)
    }

    // **NUMERIC REFINEMENTS**

    fn upsert_range(mut self, new_min: Option<f64>, new_max: Option<f64>) -> Self {
        for constraint in &mut self.constraints {
            if let Constraint::Range { min, max } = constraint {
                if new_min.is_some() {
                    *min = new_min;
                }
                if new_max.is_some() {
                    *max = new_max;
                }
                return self;
            }
        }
        self.refine(Constraint::Range {
            min: new_min,
            max: new_max,
        })
    }

    pub fn min(self, min: f64) -> Self {
        self.upsert_range(Some(min), None)
    }

    pub fn max(self, max: f64) -> Self {
        self.upsert_range(None, Some(max))
    }

    pub fn range(self, min: f64, max: f64) -> Self {
        self.upsert_range(Some(min), Some(max))
    }

    // **STRING REFINEMENTS**

    fn upsert_length(mut self, new_min: Option<usize>, new_max: Option<usize>) -> Self {
        for constraint in &mut self.constraints {
            if let Constraint::Length { min, max } = constraint {
                if new_min.is_some() {
                    *min = new_min;
                }
                if new_max.is_some() {
                    *max = new_max;
                }
                return self;
            }
        }
        self.refine(Constraint::Length {
            min: new_min,
            max: new_max,
        })
    }

    pub fn min_length(self, min: usize) -> Self {
        self.upsert_length(Some(min), None)
    }

    pub fn max_length(self, max: usize) -> Self {
        self.upsert_length(None, Some(max))
    }

    pub fn pattern(self, pattern: &str) -> Self {
        self.pattern_with_flags(pattern, "")
    }

    pub fn pattern_with_flags(mut self, pattern: &str, flags: &str) -> Self {
        match PatternRule::new(pattern, flags) {
            Ok(rule) => self.refine(Constraint::Pattern(rule)),
            Err(err) => {
                self.fail(error_codes::INVALID_PATTERN, err.to_string());
                self
            }
        }
    }

    /// Enum membership.
    pub fn valid<I, V>(self, allowed: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<JsonValue>,
    {
        self.refine(Constraint::Enum(allowed.into_iter().map(Into::into).collect()))
    }

    // **COMPOSITES**

    pub fn field(mut self, name: impl Into<String>, node: NodeBuilder) -> Self {
        match &mut self.shape {
            ShapeBuilder::Object { fields, .. } => fields.push((name.into(), node)),
            _ => {
                self.fail(
                    error_codes::INCONSISTENT_CONSTRAINT,
                    "field() used on a non-object node".to_string(),
                );
            }
        }
        self
    }

    /// At least `count` of the declared keys must appear in the candidate.
    pub fn min_present_keys(mut self, count: usize) -> Self {
        match &mut self.shape {
            ShapeBuilder::Object {
                min_present_keys, ..
            } => *min_present_keys = Some(count),
            _ => {
                self.fail(
                    error_codes::INCONSISTENT_CONSTRAINT,
                    "min_present_keys() used on a non-object node".to_string(),
                );
            }
        }
        self
    }

    pub fn unknown_keys(mut self, policy: UnknownKeys) -> Self {
        match &mut self.shape {
            ShapeBuilder::Object { unknown_keys, .. } => *unknown_keys = Some(policy),
            _ => {
                self.fail(
                    error_codes::INCONSISTENT_CONSTRAINT,
                    "unknown_keys() used on a non-object node".to_string(),
                );
            }
        }
        self
    }

    pub fn min_items(mut self, count: usize) -> Self {
        match &mut self.shape {
            ShapeBuilder::Array { min_items, .. } => *min_items = Some(count),
            _ => {
                self.fail(
                    error_codes::INCONSISTENT_CONSTRAINT,
                    "min_items() used on a non-array node".to_string(),
                );
            }
        }
        self
    }

    pub fn max_items(mut self, count: usize) -> Self {
        match &mut self.shape {
            ShapeBuilder::Array { max_items, .. } => *max_items = Some(count),
            _ => {
                self.fail(
                    error_codes::INCONSISTENT_CONSTRAINT,
                    "max_items() used on a non-array node".to_string(),
                );
            }
        }
        self
    }

    // **MESSAGES**

    pub fn message(mut self, kind: ViolationKind, template: impl Into<String>) -> Self {
        self.messages.insert(kind, template.into());
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Checks consistency and freezes the tree.
    pub fn build(self) -> Result<SchemaNode, ProjectError> {
        self.build_at(&FieldPath::root())
    }

    fn build_at(self, path: &FieldPath) -> Result<SchemaNode, ProjectError> {
        let at = if path.is_root() {
            "<root>".to_string()
        } else {
            path.to_string()
        };
        if let Some((code, reason)) = self.error {
            return Err(ProjectError::schema(code, format!("{}: {}", at, reason)));
        }
        check_constraints(&self.constraints, &self.shape, &at)?;

        let shape = match self.shape {
            ShapeBuilder::Scalar => Shape::Scalar,
            ShapeBuilder::Object {
                fields,
                min_present_keys,
                unknown_keys,
            } => {
                let mut seen = HashSet::new();
                let mut built = Vec::with_capacity(fields.len());
                for (name, node) in fields {
                    if !seen.insert(name.clone()) {
                        return Err(ProjectError::schema(
                            error_codes::DUPLICATE_FIELD,
                            format!("{}: field '{}' declared twice", at, name),
                        ));
                    }
                    let child = node.build_at(&path.child_key(name.clone()))?;
                    built.push((name, child));
                }
                if let Some(count) = min_present_keys {
                    if count > built.len() {
                        return Err(inconsistent(
                            &at,
                            format!(
                                "min_present_keys({}) exceeds the {} declared field(s)",
                                count,
                                built.len()
                            ),
                        ));
                    }
                }
                Shape::Object {
                    fields: built,
                    min_present_keys,
                    unknown_keys,
                }
            }
            ShapeBuilder::Array {
                element,
                min_items,
                max_items,
            } => {
                if let (Some(min), Some(max)) = (min_items, max_items) {
                    if min > max {
                        return Err(inconsistent(
                            &at,
                            format!("min_items({}) greater than max_items({})", min, max),
                        ));
                    }
                }
                Shape::Array {
                    element: Box::new(element.build_at(&path.child_index(0))?),
                    min_items,
                    max_items,
                }
            }
            ShapeBuilder::PatternMap { key, value } => {
                let key_path = path.child_key("<key>");
                let key = key.build_at(&key_path)?;
                if !matches!(key.shape, Shape::Scalar) {
                    return Err(inconsistent(
                        &at,
                        "pattern map key schema must be a scalar".to_string(),
                    ));
                }
                Shape::PatternMap {
                    key: Box::new(key),
                    value: Box::new(value.build_at(&path.child_key("<value>"))?),
                }
            }
        };

        let node = SchemaNode {
            shape,
            constraints: self.constraints,
            messages: self.messages,
            label: self.label,
        };
        check_default(&node, &at)?;
        Ok(node)
    }
}

fn inconsistent(at: &str, reason: String) -> ProjectError {
    ProjectError::schema(
        error_codes::INCONSISTENT_CONSTRAINT,
        format!("{}: {}", at, reason),
    )
}

fn check_constraints(
    constraints: &[Constraint],
    shape: &ShapeBuilder,
    at: &str,
) -> Result<(), ProjectError> {
    let types: Vec<ValueType> = constraints
        .iter()
        .filter_map(|c| match c {
            Constraint::Type(value_type) => Some(*value_type),
            _ => None,
        })
        .collect();
    if types.len() > 1 {
        return Err(inconsistent(at, "more than one type constraint".to_string()));
    }
    let declared = types.first().copied();
    let is_scalar = matches!(shape, ShapeBuilder::Scalar);

    if is_scalar && matches!(declared, Some(ValueType::Object) | Some(ValueType::Array)) {
        return Err(inconsistent(
            at,
            format!("scalar node cannot be typed {}", declared.map_or("", |t| t.as_str())),
        ));
    }

    for constraint in constraints {
        let needs = match constraint {
            Constraint::IntegerOnly | Constraint::Range { .. } => Some(ValueType::Number),
            Constraint::Length { .. } | Constraint::Pattern(_) | Constraint::AllowEmptyString => {
                Some(ValueType::String)
            }
            _ => None,
        };
        if let Some(needed) = needs {
            if !is_scalar || declared != Some(needed) {
                return Err(inconsistent(
                    at,
                    format!(
                        "{} requires a {} scalar, found {}",
                        constraint.name(),
                        needed,
                        declared.map_or("untyped", |t| t.as_str())
                    ),
                ));
            }
        }

        match constraint {
            Constraint::Range {
                min: Some(min),
                max: Some(max),
            } if min > max => {
                return Err(inconsistent(
                    at,
                    format!("range min {} greater than max {}", min, max),
                ));
            }
            Constraint::Length {
                min: Some(min),
                max: Some(max),
            } if min > max => {
                return Err(inconsistent(
                    at,
                    format!("length min {} greater than max {}", min, max),
                ));
            }
            Constraint::Enum(allowed) => {
                if !is_scalar {
                    return Err(inconsistent(at, "enum on a composite node".to_string()));
                }
                if allowed.is_empty() {
                    return Err(inconsistent(at, "enum with no allowed values".to_string()));
                }
                if let Some(value_type) = declared {
                    if let Some(bad) = allowed.iter().find(|v| !value_type.matches(v)) {
                        return Err(inconsistent(
                            at,
                            format!("enum value {} is not a {}", bad, value_type),
                        ));
                    }
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn check_default(node: &SchemaNode, at: &str) -> Result<(), ProjectError> {
    let Some(default) = node.default_value() else {
        return Ok(());
    };
    // no conversion: a default must already carry its declared type
    let engine = ValidationEngine::new(ValidationContext {
        convert: false,
        ..ValidationContext::default()
    });
    match engine.validate_value(node, default.clone()) {
        Ok(_) => Ok(()),
        Err(errors) => Err(ProjectError::schema(
            error_codes::INVALID_DEFAULT,
            format!(
                "{}: default {} violates its own node ({})",
                at,
                default,
                errors
                    .iter()
                    .map(|v| v.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; ")
            ),
        )),
    }
}
