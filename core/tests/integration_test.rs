use reqguard::api::*;
use serde_json::json;
use std::collections::HashMap;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn assignment_params() -> HashMap<String, String> {
    let mut params = HashMap::new();
    params.insert("course_id".to_string(), "101".to_string());
    params.insert("assignment_id".to_string(), "7".to_string());
    params
}

fn run(
    method: HttpMethod,
    route: &str,
    query: &str,
    body: &[u8],
) -> Result<ValidatedRequest, ValidationErrors> {
    let context = ValidationContext::default();
    let request = RequestBuckets::from_raw(&assignment_params(), query, body, &context).unwrap();
    catalog()
        .unwrap()
        .validate(ValidationEngine::shared(), method, route, request)
        .expect("route registered")
}

#[test]
fn test_grade_list_from_query_string() {
    init_logging();
    let validated = run(HttpMethod::GET, routes::GRADES, "?limit=50&status=graded", b"").unwrap();
    assert_eq!(
        validated.query,
        Some(json!({"page": 1, "limit": 50, "status": "graded"}))
    );
    assert_eq!(validated.body, None);
}

#[test]
fn test_export_flag_from_query_string() {
    init_logging();
    let validated = run(
        HttpMethod::GET,
        routes::GRADES_EXPORT,
        "format=xlsx&include_feedback=true",
        b"",
    )
    .unwrap();
    assert_eq!(
        validated.query,
        Some(json!({"format": "xlsx", "include_feedback": true}))
    );
}

#[test]
fn test_rubric_create_accepted() {
    init_logging();
    let body = br#"{
        "name": "Lab report",
        "description": "",
        "criteria": [
            {
                "name": "Method",
                "weight": "40",
                "levels": [
                    {"label": "Complete", "points": 4},
                    {"label": "Partial", "points": "2", "description": ""}
                ]
            }
        ]
    }"#;
    let validated = run(HttpMethod::POST, routes::RUBRIC, "", body).unwrap();
    let normalized = validated.body.unwrap();
    assert_eq!(normalized["criteria"][0]["weight"], json!(40));
    assert_eq!(normalized["criteria"][0]["levels"][1]["points"], json!(2));
}

#[test]
fn test_grade_batch_reports_every_row() {
    init_logging();
    let body = json!({"grades": [
        {"submission_id": 1, "grade": 95},
        {"submission_id": 0, "grade": 80},
        {"submission_id": 3, "grade": "high"},
        {"submission_id": 4, "grade": 70, "criterion_scores": {"x1": {"points": 1}}},
        {"grade": 60}
    ]})
    .to_string();
    let errors = run(HttpMethod::POST, routes::GRADES, "", body.as_bytes()).unwrap_err();

    let found: Vec<_> = errors.iter().map(|v| (v.location(), v.code())).collect();
    assert_eq!(
        found,
        vec![
            ("body.grades[1].submission_id".to_string(), error_codes::OUT_OF_RANGE),
            ("body.grades[2].grade".to_string(), error_codes::TYPE_MISMATCH),
            (
                "body.grades[3].criterion_scores.x1".to_string(),
                error_codes::KEY_VALIDATION_FAILURE
            ),
            (
                "body.grades[4].submission_id".to_string(),
                error_codes::MISSING_REQUIRED_FIELD
            ),
        ]
    );
}

#[test]
fn test_oversized_grade_batch() {
    init_logging();
    let grades: Vec<_> = (1..=501)
        .map(|id| json!({"submission_id": id, "grade": 50}))
        .collect();
    let body = json!({ "grades": grades }).to_string();
    let errors = run(HttpMethod::POST, routes::GRADES, "", body.as_bytes()).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.violations[0].kind, ViolationKind::ArraySizeViolation);
    assert_eq!(
        errors.violations[0].message,
        "\"grades\" must contain less than or equal to 500 items"
    );
}

#[test]
fn test_rubric_update_with_only_unknown_keys() {
    init_logging();
    let errors = run(HttpMethod::PATCH, routes::RUBRIC, "", br#"{"colour": "red"}"#).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.violations[0].kind, ViolationKind::NoRecognizedFieldsSupplied);
}

#[test]
fn test_malformed_body_is_not_a_violation() {
    init_logging();
    let err = RequestBuckets::from_raw(
        &assignment_params(),
        "",
        b"{not json",
        &ValidationContext::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ProjectError::Request { .. }));
    assert_eq!(err.code(), error_codes::INVALID_JSON);
}

#[test]
fn test_strict_engine_rejects_unknown_fields() {
    init_logging();
    let engine = ValidationEngine::new(ValidationContext {
        unknown_keys: UnknownKeys::Reject,
        ..ValidationContext::default()
    });
    let bundle = catalog()
        .unwrap()
        .lookup(HttpMethod::POST, routes::REGRADE)
        .unwrap();
    let request = RequestBuckets::new()
        .with_params(json!({"course_id": "1", "assignment_id": "2", "submission_id": "3"}))
        .with_body(json!({"reason": "typo in total", "urgent": true}));
    let errors = engine.validate(bundle, request).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.violations[0].location(), "body.urgent");
    assert_eq!(errors.violations[0].message, "\"urgent\" is not allowed");
}

#[test]
fn test_concurrent_validation_is_deterministic() {
    init_logging();
    let body = json!({"grades": [{"submission_id": "x", "grade": 101}]}).to_string();
    let expected = run(HttpMethod::POST, routes::GRADES, "", body.as_bytes()).unwrap_err();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let body = body.clone();
            std::thread::spawn(move || {
                run(HttpMethod::POST, routes::GRADES, "", body.as_bytes()).unwrap_err()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
