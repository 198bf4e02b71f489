pub mod parser;
pub mod types;

pub use parser::{params_from_map, parse_json_body, parse_query_string};
pub use types::{RequestBuckets, ValidatedRequest};
