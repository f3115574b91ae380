//! Normalized endpoint records supplied by the catalog loader

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Suite name for endpoints that declare no tags.
pub const DEFAULT_SUITE: &str = "General";

/// A single API operation from the catalog.
///
/// Identity is `(path, method)`. The record is never mutated once loaded;
/// resolution produces a new path string instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Endpoint {
    /// Path template, e.g. `/drivers/{driver_id}`
    pub path: String,
    /// Upper-case HTTP verb
    pub method: String,
    /// OpenAPI tags, in declaration order
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Raw OpenAPI parameter list (opaque to the engine)
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub parameters: serde_json::Value,
    /// Raw OpenAPI request body object (opaque to the engine)
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub request_body: serde_json::Value,
}

impl Endpoint {
    /// Minimal endpoint with no tags or OpenAPI metadata.
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: method.into().to_uppercase(),
            tags: Vec::new(),
            summary: None,
            operation_id: None,
            parameters: serde_json::Value::Null,
            request_body: serde_json::Value::Null,
        }
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Operation label, e.g. "GET /drivers"
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    /// Whether `(path, method)` identifies this endpoint.
    #[must_use]
    pub fn matches(&self, path: &str, method: &str) -> bool {
        self.path == path && self.method.eq_ignore_ascii_case(method)
    }

    /// True when the path template contains at least one `{`.
    ///
    /// Such endpoints are treated as consumers of learned identifiers.
    #[must_use]
    pub fn has_placeholders(&self) -> bool {
        self.path.contains('{')
    }

    /// Key used to look up per-operation test data.
    ///
    /// `operationId` when declared, otherwise `"{METHOD}_{path}"`.
    #[must_use]
    pub fn operation_key(&self) -> String {
        match &self.operation_id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => format!("{}_{}", self.method, self.path),
        }
    }

    /// Suites this endpoint belongs to. Untagged endpoints land in [`DEFAULT_SUITE`].
    pub fn suites(&self) -> impl Iterator<Item = &str> {
        let fallback = self.tags.is_empty().then_some(DEFAULT_SUITE);
        self.tags.iter().map(String::as_str).chain(fallback)
    }

    #[must_use]
    pub fn in_suite(&self, suite: &str) -> bool {
        self.suites().any(|s| s == suite)
    }
}

/// Sorted, de-duplicated suite names across a catalog.
#[must_use]
pub fn suite_names(endpoints: &[Endpoint]) -> Vec<String> {
    let mut names: Vec<String> = endpoints
        .iter()
        .flat_map(|ep| ep.suites().map(str::to_string))
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Endpoints belonging to any of the given suites, catalog order, no duplicates.
#[must_use]
pub fn select_suites(endpoints: &[Endpoint], suites: &[String]) -> Vec<Endpoint> {
    endpoints
        .iter()
        .filter(|ep| suites.iter().any(|s| ep.in_suite(s)))
        .cloned()
        .collect()
}
