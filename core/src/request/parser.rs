use crate::config::ValidationContext;
use crate::errors::{error_codes, ProjectError};
use crate::request::types::RequestBuckets;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;

/// Decodes `a=1&b=x%20y` into a JSON object of strings.
/// Repeated keys collect into an array; a bare key maps to `""`.
pub fn parse_query_string(query: &str) -> JsonValue {
    let mut map = Map::new();
    let query = query.strip_prefix('?').unwrap_or(query);

    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let mut parts = pair.splitn(2, '=');
        let (Some(raw_key), raw_value) = (parts.next(), parts.next()) else {
            continue;
        };
        let (Some(key), Some(value)) = (decode(raw_key), decode(raw_value.unwrap_or(""))) else {
            continue;
        };
        if key.is_empty() {
            continue;
        }

        match map.get_mut(&key) {
            Some(JsonValue::Array(values)) => values.push(JsonValue::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = JsonValue::Array(vec![first, JsonValue::String(value)]);
            }
            None => {
                map.insert(key, JsonValue::String(value));
            }
        }
    }

    JsonValue::Object(map)
}

fn decode(raw: &str) -> Option<String> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).ok().map(|decoded| decoded.into_owned())
}

/// Parses a raw JSON body. Empty or whitespace-only input means "no body".
pub fn parse_json_body(data: &[u8], max_bytes: usize) -> Result<Option<JsonValue>, ProjectError> {
    if data.len() > max_bytes {
        return Err(ProjectError::request(
            error_codes::BODY_TOO_LARGE,
            format!("Body size {} exceeds limit {}", data.len(), max_bytes),
        ));
    }

    let text = std::str::from_utf8(data).map_err(|e| {
        ProjectError::request(error_codes::INVALID_UTF8, format!("Invalid UTF-8: {}", e))
    })?;
    if text.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str(text)
        .map(Some)
        .map_err(|e| ProjectError::request(error_codes::INVALID_JSON, format!("Invalid JSON: {}", e)))
}

/// Path parameters as captured by a router: always strings.
pub fn params_from_map(params: &HashMap<String, String>) -> JsonValue {
    JsonValue::Object(
        params
            .iter()
            .map(|(key, value)| (key.clone(), JsonValue::String(value.clone())))
            .collect(),
    )
}

impl RequestBuckets {
    /// Assembles buckets from what a router and transport hand over.
    pub fn from_raw(
        params: &HashMap<String, String>,
        query: &str,
        body: &[u8],
        context: &ValidationContext,
    ) -> Result<Self, ProjectError> {
        Ok(Self {
            params: Some(params_from_map(params)),
            query: Some(parse_query_string(query)),
            body: parse_json_body(body, context.max_body_bytes)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_query_string_simple() {
        let result = parse_query_string("key1=value1&key2=value2");
        assert_eq!(result, json!({"key1": "value1", "key2": "value2"}));
    }

    #[test]
    fn test_parse_query_string_encoded() {
        let result = parse_query_string("?name=John%20Doe&city=New+York");
        assert_eq!(result, json!({"name": "John Doe", "city": "New York"}));
    }

    #[test]
    fn test_parse_query_string_empty() {
        assert_eq!(parse_query_string(""), json!({}));
    }

    #[test]
    fn test_parse_query_string_repeated_and_bare_keys() {
        let result = parse_query_string("status=graded&status=ungraded&status=all&flag");
        assert_eq!(
            result,
            json!({"status": ["graded", "ungraded", "all"], "flag": ""})
        );
    }

    #[test]
    fn test_parse_json_body_valid() {
        let result = parse_json_body(br#"{"name": "test", "value": 42}"#, 1024).unwrap();
        assert_eq!(result, Some(json!({"name": "test", "value": 42})));
    }

    #[test]
    fn test_parse_json_body_empty_is_absent() {
        assert_eq!(parse_json_body(b"  \n", 1024).unwrap(), None);
    }

    #[test]
    fn test_parse_json_body_invalid() {
        let err = parse_json_body(br#"{"name": "test", invalid}"#, 1024).unwrap_err();
        assert_eq!(err.code(), error_codes::INVALID_JSON);
    }

    #[test]
    fn test_parse_json_body_too_large() {
        let err = parse_json_body(b"[1, 2, 3]", 4).unwrap_err();
        assert_eq!(err.code(), error_codes::BODY_TOO_LARGE);
        assert!(err.to_string().contains("exceeds limit 4"));
    }

    #[test]
    fn test_parse_json_body_invalid_utf8() {
        let err = parse_json_body(&[0xFF, 0xFE, 0xFD], 1024).unwrap_err();
        assert_eq!(err.code(), error_codes::INVALID_UTF8);
    }

    #[test]
    fn test_from_raw() {
        let mut params = HashMap::new();
        params.insert("course_id".to_string(), "7".to_string());
        let buckets = RequestBuckets::from_raw(
            &params,
            "page=2",
            br#"{"reason": "late"}"#,
            &ValidationContext::default(),
        )
        .unwrap();
        assert_eq!(buckets.params, Some(json!({"course_id": "7"})));
        assert_eq!(buckets.query, Some(json!({"page": "2"})));
        assert_eq!(buckets.body, Some(json!({"reason": "late"})));
    }
}
