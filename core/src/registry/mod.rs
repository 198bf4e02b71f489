//! # SCHEMA REGISTRY
//!
//! **PURPOSE**: Per-endpoint bundles of up to three schema nodes, one per bucket.
//! **LIFECYCLE**: Filled once at startup, read concurrently afterwards with no
//! locking; nothing in here mutates after registration.

use crate::errors::{error_codes, ProjectError};
use crate::request::{RequestBuckets, ValidatedRequest};
use crate::validation::{SchemaNode, ValidationEngine, ValidationErrors};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;

pub mod route;

pub use route::{Endpoint, HttpMethod};

/// One independently validated section of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Params,
    Query,
    Body,
}

impl Bucket {
    /// Evaluation and reporting order.
    pub const ALL: [Bucket; 3] = [Bucket::Params, Bucket::Query, Bucket::Body];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Params => "params",
            Bucket::Query => "query",
            Bucket::Body => "body",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// **ENDPOINT SCHEMA BUNDLE** - zero to three nodes
#[derive(Debug, Clone, Default)]
pub struct SchemaBundle {
    params: Option<SchemaNode>,
    query: Option<SchemaNode>,
    body: Option<SchemaNode>,
}

impl SchemaBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn params(mut self, node: SchemaNode) -> Self {
        self.params = Some(node);
        self
    }

    pub fn query(mut self, node: SchemaNode) -> Self {
        self.query = Some(node);
        self
    }

    pub fn body(mut self, node: SchemaNode) -> Self {
        self.body = Some(node);
        self
    }

    pub fn node(&self, bucket: Bucket) -> Option<&SchemaNode> {
        match bucket {
            Bucket::Params => self.params.as_ref(),
            Bucket::Query => self.query.as_ref(),
            Bucket::Body => self.body.as_ref(),
        }
    }

    pub fn declared_buckets(&self) -> Vec<Bucket> {
        Bucket::ALL
            .into_iter()
            .filter(|bucket| self.node(*bucket).is_some())
            .collect()
    }
}

/// Result of resolving a concrete request path.
#[derive(Debug, Clone)]
pub struct RouteMatch<'r> {
    pub endpoint: &'r Endpoint,
    pub bundle: &'r SchemaBundle,
    pub params: JsonValue,
}

#[derive(Debug, Default)]
pub struct SchemaRegistry {
    entries: Vec<(Endpoint, SchemaBundle)>,
    index: HashMap<(HttpMethod, String), usize>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        method: HttpMethod,
        route: &str,
        bundle: SchemaBundle,
    ) -> Result<(), ProjectError> {
        let key = (method, route.to_string());
        if self.index.contains_key(&key) {
            return Err(ProjectError::registry(
                error_codes::DUPLICATE_ENDPOINT,
                format!("Endpoint {} {} registered twice", method, route),
            ));
        }
        let endpoint = Endpoint::new(method, route)?;
        log::debug!(
            "registered schemas for {} (buckets: {:?})",
            endpoint,
            bundle.declared_buckets()
        );
        self.index.insert(key, self.entries.len());
        self.entries.push((endpoint, bundle));
        Ok(())
    }

    /// Chained form of [`register`](Self::register) for startup code.
    pub fn with(
        mut self,
        method: HttpMethod,
        route: &str,
        bundle: SchemaBundle,
    ) -> Result<Self, ProjectError> {
        self.register(method, route, bundle)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn endpoints(&self) -> impl Iterator<Item = &Endpoint> {
        self.entries.iter().map(|(endpoint, _)| endpoint)
    }

    /// Bundle registered under the exact route template.
    pub fn lookup(&self, method: HttpMethod, route: &str) -> Option<&SchemaBundle> {
        self.index
            .get(&(method, route.to_string()))
            .map(|position| &self.entries[*position].1)
    }

    /// First registered endpoint whose template matches `path`.
    pub fn match_path(&self, method: HttpMethod, path: &str) -> Option<RouteMatch<'_>> {
        self.entries
            .iter()
            .filter(|(endpoint, _)| endpoint.method == method)
            .find_map(|(endpoint, bundle)| {
                endpoint.capture(path).map(|params| RouteMatch {
                    endpoint,
                    bundle,
                    params,
                })
            })
    }

    /// Validates a request against the endpoint registered under `route`.
    /// Returns `None` when nothing is registered there.
    pub fn validate(
        &self,
        engine: &ValidationEngine,
        method: HttpMethod,
        route: &str,
        request: RequestBuckets,
    ) -> Option<Result<ValidatedRequest, ValidationErrors>> {
        match self.lookup(method, route) {
            Some(bundle) => Some(engine.validate(bundle, request)),
            None => {
                log::warn!("no schemas registered for {} {}", method, route);
                None
            }
        }
    }
}
