//! # REQGUARD CORE LIBRARY
//!
//! **DECLARATIVE REQUEST VALIDATION FOR HTTP ENDPOINTS**
//!
//! **ARCHITECTURE**: Schemas as data, one interpreter for all of them
//! **GUARANTEE**: Every violation in a request is reported, in a stable order
//! **CONCURRENCY**: Schemas and the registry are immutable after startup

pub mod api;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod registry;
pub mod request;

// **VALIDATION MODULE REGISTRATION**
pub mod validation;

#[cfg(test)]
mod tests {
    use crate::api::*;
    use serde_json::json;

    #[test]
    fn test_raw_request_pipeline() {
        // **STEP 1**: Resolve the route and capture path parameters
        let registry = catalog().unwrap();
        let matched = registry
            .match_path(
                HttpMethod::POST,
                "/courses/8/assignments/21/submissions/5/regrade",
            )
            .unwrap();
        assert_eq!(matched.endpoint.route, routes::REGRADE);

        // **STEP 2**: Assemble buckets from raw transport data
        let context = ValidationContext::default();
        let request = RequestBuckets::new()
            .with_params(matched.params.clone())
            .with_query(parse_query_string(""))
            .with_body(
                parse_json_body(br#"{"reason": "rubric misapplied"}"#, context.max_body_bytes)
                    .unwrap()
                    .unwrap(),
            );

        // **STEP 3**: Validate
        let validated = ValidationEngine::shared()
            .validate(matched.bundle, request)
            .unwrap();
        assert_eq!(
            validated.params,
            Some(json!({"course_id": 8, "assignment_id": 21, "submission_id": 5}))
        );
        assert_eq!(validated.body, Some(json!({"reason": "rubric misapplied"})));
    }

    #[test]
    fn test_error_report_serializes() {
        let schema = NodeBuilder::object()
            .field("grade", NodeBuilder::number().required().range(0.0, 100.0))
            .build()
            .unwrap();
        let errors = schema.validate(json!({"grade": 101})).unwrap_err();
        assert_eq!(errors.to_string(), "VALIDATION ERROR: 1 violation(s)");

        let report = serde_json::to_value(&errors).unwrap();
        assert_eq!(report["violations"][0]["path"], json!("grade"));
        assert_eq!(report["violations"][0]["kind"], json!("out_of_range"));
    }

    #[test]
    fn test_schema_errors_are_project_errors() {
        let err: ProjectError = NodeBuilder::boolean().min_length(1).build().unwrap_err();
        assert!(matches!(err, ProjectError::Schema { .. }));
    }
}
