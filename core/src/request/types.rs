use crate::registry::Bucket;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// **UNTYPED REQUEST INPUT**
///
/// `params` and `query` default to empty objects (a router always supplies
/// them); `body` is absent until the caller provides one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBuckets {
    pub params: Option<JsonValue>,
    pub query: Option<JsonValue>,
    pub body: Option<JsonValue>,
}

impl Default for RequestBuckets {
    fn default() -> Self {
        Self {
            params: Some(JsonValue::Object(Map::new())),
            query: Some(JsonValue::Object(Map::new())),
            body: None,
        }
    }
}

impl RequestBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(mut self, params: JsonValue) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_query(mut self, query: JsonValue) -> Self {
        self.query = Some(query);
        self
    }

    pub fn with_body(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    pub fn get(&self, bucket: Bucket) -> Option<&JsonValue> {
        match bucket {
            Bucket::Params => self.params.as_ref(),
            Bucket::Query => self.query.as_ref(),
            Bucket::Body => self.body.as_ref(),
        }
    }
}

/// **NORMALIZED REQUEST**
///
/// Same three buckets, type-coerced, with declared defaults filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatedRequest {
    pub params: Option<JsonValue>,
    pub query: Option<JsonValue>,
    pub body: Option<JsonValue>,
}

impl ValidatedRequest {
    pub fn get(&self, bucket: Bucket) -> Option<&JsonValue> {
        match bucket {
            Bucket::Params => self.params.as_ref(),
            Bucket::Query => self.query.as_ref(),
            Bucket::Body => self.body.as_ref(),
        }
    }

    pub(crate) fn take(&mut self, bucket: Bucket) -> Option<JsonValue> {
        match bucket {
            Bucket::Params => self.params.take(),
            Bucket::Query => self.query.take(),
            Bucket::Body => self.body.take(),
        }
    }

    pub(crate) fn set(&mut self, bucket: Bucket, value: Option<JsonValue>) {
        match bucket {
            Bucket::Params => self.params = value,
            Bucket::Query => self.query = value,
            Bucket::Body => self.body = value,
        }
    }
}

impl From<RequestBuckets> for ValidatedRequest {
    fn from(request: RequestBuckets) -> Self {
        Self {
            params: request.params,
            query: request.query,
            body: request.body,
        }
    }
}
