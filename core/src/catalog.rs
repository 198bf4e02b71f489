//! # GRADING API CATALOG
//!
//! Schemas for the rubric and grading endpoints. Built once on first use and
//! shared for the life of the process.

use crate::errors::ProjectError;
use crate::registry::{HttpMethod, SchemaBundle, SchemaRegistry};
use crate::validation::{NodeBuilder, ViolationKind};
use once_cell::sync::OnceCell;

static CATALOG: OnceCell<SchemaRegistry> = OnceCell::new();

pub mod routes {
    pub const RUBRIC: &str = "/courses/{course_id}/assignments/{assignment_id}/rubric";
    pub const GRADES: &str = "/courses/{course_id}/assignments/{assignment_id}/grades";
    pub const GRADES_EXPORT: &str =
        "/courses/{course_id}/assignments/{assignment_id}/grades/export";
    pub const REGRADE: &str =
        "/courses/{course_id}/assignments/{assignment_id}/submissions/{submission_id}/regrade";
}

pub const MAX_GRADES_PER_BATCH: usize = 500;

/// The process-wide catalog; a schema authoring mistake surfaces here on first call.
pub fn catalog() -> Result<&'static SchemaRegistry, ProjectError> {
    CATALOG.get_or_try_init(build_catalog)
}

pub fn build_catalog() -> Result<SchemaRegistry, ProjectError> {
    let assignment = || assignment_params().build();

    SchemaRegistry::new()
        .with(
            HttpMethod::GET,
            routes::RUBRIC,
            SchemaBundle::new().params(assignment()?),
        )?
        .with(
            HttpMethod::POST,
            routes::RUBRIC,
            SchemaBundle::new()
                .params(assignment()?)
                .body(rubric_create_body().build()?),
        )?
        .with(
            HttpMethod::PATCH,
            routes::RUBRIC,
            SchemaBundle::new()
                .params(assignment()?)
                .body(rubric_update_body().build()?),
        )?
        .with(
            HttpMethod::GET,
            routes::GRADES,
            SchemaBundle::new()
                .params(assignment()?)
                .query(grade_list_query().build()?),
        )?
        .with(
            HttpMethod::POST,
            routes::GRADES,
            SchemaBundle::new()
                .params(assignment()?)
                .body(grade_batch_body().build()?),
        )?
        .with(
            HttpMethod::GET,
            routes::GRADES_EXPORT,
            SchemaBundle::new()
                .params(assignment()?)
                .query(export_query().build()?),
        )?
        .with(
            HttpMethod::POST,
            routes::REGRADE,
            SchemaBundle::new()
                .params(
                    assignment_params()
                        .field("submission_id", id_param())
                        .build()?,
                )
                .body(regrade_body().build()?),
        )
}

fn id_param() -> NodeBuilder {
    NodeBuilder::integer().required().min(1.0)
}

pub fn assignment_params() -> NodeBuilder {
    NodeBuilder::object()
        .field("course_id", id_param())
        .field("assignment_id", id_param())
}

fn level() -> NodeBuilder {
    NodeBuilder::object()
        .field("label", NodeBuilder::string().required().max_length(100))
        .field("points", NodeBuilder::number().required().min(0.0))
        .field("description", NodeBuilder::string().allow_empty().max_length(2000))
}

fn criterion() -> NodeBuilder {
    NodeBuilder::object()
        .field("name", NodeBuilder::string().required().max_length(200))
        .field("description", NodeBuilder::string().allow_empty().max_length(2000))
        .field("weight", NodeBuilder::number().range(0.0, 100.0))
        .field(
            "levels",
            NodeBuilder::array(level())
                .required()
                .min_items(1)
                .message(
                    ViolationKind::ArraySizeViolation,
                    "\"{label}\" needs at least {limit} scoring level",
                ),
        )
}

pub fn rubric_create_body() -> NodeBuilder {
    NodeBuilder::object()
        .field("name", NodeBuilder::string().required().max_length(200))
        .field("description", NodeBuilder::string().allow_empty().max_length(5000))
        .field(
            "criteria",
            NodeBuilder::array(criterion()).required().min_items(1).max_items(50),
        )
        .required()
}

pub fn rubric_update_body() -> NodeBuilder {
    NodeBuilder::object()
        .field("name", NodeBuilder::string().max_length(200))
        .field("description", NodeBuilder::string().allow_empty().max_length(5000))
        .field(
            "criteria",
            NodeBuilder::array(criterion()).min_items(1).max_items(50),
        )
        .min_present_keys(1)
        .message(
            ViolationKind::NoRecognizedFieldsSupplied,
            "update must contain at least one of name, description, criteria",
        )
        .required()
}

fn criterion_scores() -> NodeBuilder {
    NodeBuilder::pattern_map(
        NodeBuilder::key_pattern(r"^\d+$").message(
            ViolationKind::KeyValidationFailure,
            "criterion id \"{key}\" must be numeric",
        ),
        NodeBuilder::object()
            .field("points", NodeBuilder::number().required().min(0.0))
            .field("comment", NodeBuilder::string().allow_empty().max_length(2000)),
    )
}

fn grade_entry() -> NodeBuilder {
    NodeBuilder::object()
        .field("submission_id", id_param())
        .field(
            "grade",
            NodeBuilder::number()
                .required()
                .range(0.0, 100.0)
                .message(
                    ViolationKind::OutOfRange,
                    "\"{label}\" must be between 0 and 100",
                ),
        )
        .field("feedback", NodeBuilder::string().allow_empty().max_length(5000))
        .field("criterion_scores", criterion_scores())
        .field("additional_points", NodeBuilder::number().default(0))
        .field("deductions", NodeBuilder::number().default(0))
}

pub fn grade_batch_body() -> NodeBuilder {
    NodeBuilder::object()
        .field(
            "grades",
            NodeBuilder::array(grade_entry())
                .required()
                .min_items(1)
                .max_items(MAX_GRADES_PER_BATCH),
        )
        .required()
}

pub fn regrade_body() -> NodeBuilder {
    NodeBuilder::object()
        .field(
            "reason",
            NodeBuilder::string()
                .required()
                .max_length(2000)
                .message(
                    ViolationKind::MissingRequiredField,
                    "a reason is required to request a regrade",
                ),
        )
        .required()
}

pub fn export_query() -> NodeBuilder {
    NodeBuilder::object()
        .field(
            "format",
            NodeBuilder::string().valid(["csv", "xlsx"]).default("csv"),
        )
        .field("include_feedback", NodeBuilder::boolean().default(false))
}

pub fn grade_list_query() -> NodeBuilder {
    NodeBuilder::object()
        .field("page", NodeBuilder::integer().min(1.0).default(1))
        .field("limit", NodeBuilder::integer().range(1.0, 100.0).default(20))
        .field(
            "status",
            NodeBuilder::string().valid(["graded", "ungraded", "all"]),
        )
}
