pub use crate::catalog::{catalog, routes};
pub use crate::config::ValidationContext;
pub use crate::errors::{error_codes, ProjectError};
pub use crate::registry::{Bucket, Endpoint, HttpMethod, RouteMatch, SchemaBundle, SchemaRegistry};
pub use crate::request::{parse_json_body, parse_query_string, RequestBuckets, ValidatedRequest};
pub use crate::validation::{
    NodeBuilder, SchemaNode, UnknownKeys, ValidationEngine, ValidationErrors, Validator,
    Violation, ViolationKind,
};
