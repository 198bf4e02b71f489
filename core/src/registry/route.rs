use crate::errors::{error_codes, ProjectError};
use regex::Regex;
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
    HEAD,
    OPTIONS,
    TRACE,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::OPTIONS => "OPTIONS",
            HttpMethod::TRACE => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ProjectError;

    fn from_str(method: &str) -> Result<Self, Self::Err> {
        match method.to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::GET),
            "POST" => Ok(HttpMethod::POST),
            "PUT" => Ok(HttpMethod::PUT),
            "DELETE" => Ok(HttpMethod::DELETE),
            "PATCH" => Ok(HttpMethod::PATCH),
            "HEAD" => Ok(HttpMethod::HEAD),
            "OPTIONS" => Ok(HttpMethod::OPTIONS),
            "TRACE" => Ok(HttpMethod::TRACE),
            _ => Err(ProjectError::registry(
                error_codes::INVALID_HTTP_METHOD,
                format!("Invalid HTTP method: {}", method),
            )),
        }
    }
}

/// A registered route template such as `/courses/{course_id}/rubric`.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub method: HttpMethod,
    pub route: String,
    path_regex: Regex,
    param_names: Vec<String>,
}

impl Endpoint {
    pub fn new(method: HttpMethod, route: &str) -> Result<Self, ProjectError> {
        let mut regex_pattern = String::from("^");
        let mut param_names = Vec::new();

        for part in route.split('/').filter(|part| !part.is_empty()) {
            regex_pattern.push('/');
            if part.starts_with('{') && part.ends_with('}') && part.len() > 2 {
                let param_name = &part[1..part.len() - 1];
                if param_names.iter().any(|name| name == param_name) {
                    return Err(ProjectError::registry(
                        error_codes::INVALID_ROUTE_PATTERN,
                        format!("Parameter '{}' repeated in route {}", param_name, route),
                    ));
                }
                param_names.push(param_name.to_string());
                regex_pattern.push_str(r"([^/]+)");
            } else {
                regex_pattern.push_str(&regex::escape(part));
            }
        }
        if param_names.is_empty() && regex_pattern == "^" {
            regex_pattern.push('/');
        }
        regex_pattern.push_str("/?$");

        let path_regex = Regex::new(&regex_pattern).map_err(|e| {
            ProjectError::registry(
                error_codes::INVALID_ROUTE_PATTERN,
                format!("Invalid route pattern {}: {}", route, e),
            )
        })?;

        Ok(Self {
            method,
            route: route.to_string(),
            path_regex,
            param_names,
        })
    }

    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Captures path parameters as a `params` bucket of strings.
    pub fn capture(&self, path: &str) -> Option<JsonValue> {
        let captures = self.path_regex.captures(path)?;
        let mut params = Map::new();
        for (i, param_name) in self.param_names.iter().enumerate() {
            if let Some(value) = captures.get(i + 1) {
                let decoded = urlencoding::decode(value.as_str())
                    .map(|decoded| decoded.into_owned())
                    .unwrap_or_else(|_| value.as_str().to_string());
                params.insert(param_name.clone(), JsonValue::String(decoded));
            }
        }
        Some(JsonValue::Object(params))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_parsing() {
        assert_eq!("patch".parse::<HttpMethod>().unwrap(), HttpMethod::PATCH);
        let err = "BREW".parse::<HttpMethod>().unwrap_err();
        assert_eq!(err.code(), error_codes::INVALID_HTTP_METHOD);
    }

    #[test]
    fn test_capture_params() {
        let endpoint = Endpoint::new(
            HttpMethod::GET,
            "/courses/{course_id}/assignments/{assignment_id}/rubric",
        )
        .unwrap();
        assert_eq!(endpoint.param_names(), ["course_id", "assignment_id"]);
        assert_eq!(
            endpoint.capture("/courses/12/assignments/a%20b/rubric"),
            Some(json!({"course_id": "12", "assignment_id": "a b"}))
        );
        assert_eq!(endpoint.capture("/courses/12/rubric"), None);
    }

    #[test]
    fn test_trailing_slash_and_root() {
        let endpoint = Endpoint::new(HttpMethod::GET, "/grades").unwrap();
        assert!(endpoint.capture("/grades/").is_some());
        assert!(endpoint.capture("/grades/x").is_none());

        let root = Endpoint::new(HttpMethod::GET, "/").unwrap();
        assert_eq!(root.capture("/"), Some(json!({})));
    }

    #[test]
    fn test_repeated_param_rejected() {
        let err = Endpoint::new(HttpMethod::GET, "/a/{id}/b/{id}").unwrap_err();
        assert_eq!(err.code(), error_codes::INVALID_ROUTE_PATTERN);
    }
}
