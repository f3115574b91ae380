//! Per-operation test data
//!
//! ```json
//! {
//!   "headers": {"Authorization": "Bearer t"},
//!   "createDriver": {"body": {"name": "Amy"}},
//!   "GET_/reports/{slug}": {"parameters": {"slug": "weekly"}}
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::endpoint::Endpoint;
use crate::extract::scalar_to_string;

/// Test data keyed by operation key (see [`Endpoint::operation_key`]).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestData {
    root: Map<String, Value>,
}

impl TestData {
    /// Parse test data from JSON text. The top level must be an object.
    ///
    /// # Errors
    ///
    /// Returns error if the text is not a JSON object.
    pub fn parse(text: &str) -> Result<Self, TestDataError> {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(root)) => Ok(Self { root }),
            Ok(other) => Err(TestDataError::NotAnObject(json_kind(&other))),
            Err(e) => Err(TestDataError::Parse(e.to_string())),
        }
    }

    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not a JSON object.
    pub fn load(path: &Path) -> Result<Self, TestDataError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| TestDataError::Io(path.to_path_buf(), e.to_string()))?;
        Self::parse(&text)
    }

    fn entry(&self, endpoint: &Endpoint) -> Option<&Map<String, Value>> {
        self.root
            .get(&endpoint.operation_key())
            .and_then(Value::as_object)
    }

    /// Scalar path/query parameters declared for this operation.
    #[must_use]
    pub fn parameters(&self, endpoint: &Endpoint) -> HashMap<String, String> {
        self.entry(endpoint)
            .and_then(|e| e.get("parameters"))
            .and_then(Value::as_object)
            .map(|params| {
                params
                    .iter()
                    .filter_map(|(k, v)| scalar_to_string(v).map(|s| (k.clone(), s)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Request body for this operation, if any.
    #[must_use]
    pub fn body(&self, endpoint: &Endpoint) -> Option<&Value> {
        self.entry(endpoint).and_then(|e| e.get("body"))
    }

    /// Top-level `headers` object, scalar values only.
    #[must_use]
    pub fn headers(&self) -> HashMap<String, String> {
        self.root
            .get("headers")
            .and_then(Value::as_object)
            .map(|h| {
                h.iter()
                    .filter_map(|(k, v)| scalar_to_string(v).map(|s| (k.clone(), s)))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TestDataError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Invalid test data JSON: {0}")]
    Parse(String),
    #[error("Test data must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}
