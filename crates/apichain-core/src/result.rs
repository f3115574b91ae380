//! Execution records: raw executor output, per-endpoint outcomes, result log

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::endpoint::Endpoint;

/// What a single-request executor reports back.
///
/// `endpoint` is the path that was actually requested (already resolved).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RawResult {
    pub endpoint: String,
    pub method: String,
    /// HTTP status; `0` when the executor never got one
    pub status: u16,
    pub time_ms: f64,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Full URL, for debugging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// One completed invocation, keyed by the unresolved path template.
///
/// Keeping the template (not the resolved path) lets results be joined
/// back to catalog entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExecutionResult {
    /// Original path template, e.g. `/drivers/{driver_id}`
    pub endpoint: String,
    pub method: String,
    pub status: u16,
    pub time_ms: f64,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Path that was requested after substitution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ExecutionResult {
    /// Attach a raw executor result to the catalog endpoint that produced it.
    #[must_use]
    pub fn from_raw(template: &Endpoint, raw: RawResult) -> Self {
        Self {
            endpoint: template.path.clone(),
            method: template.method.clone(),
            status: raw.status,
            time_ms: raw.time_ms,
            passed: raw.passed,
            response: raw.response,
            error: raw.error,
            resolved_path: Some(raw.endpoint),
            url: raw.url,
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.endpoint)
    }

    #[must_use]
    pub fn is_for(&self, path: &str, method: &str) -> bool {
        self.endpoint == path && self.method.eq_ignore_ascii_case(method)
    }
}

/// Result of attempting one endpoint in a batch.
///
/// Every endpoint in a batch produces exactly one outcome, so a transport
/// failure is visible instead of silently missing from the results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EndpointOutcome {
    /// The executor returned a result (passed or not)
    Executed(ExecutionResult),
    /// The executor could not complete the call
    TransportError {
        endpoint: String,
        method: String,
        resolved_path: String,
        error: String,
    },
    /// Not attempted
    Skipped {
        endpoint: String,
        method: String,
        resolved_path: String,
        reason: String,
    },
}

impl EndpointOutcome {
    #[must_use]
    pub fn result(&self) -> Option<&ExecutionResult> {
        match self {
            Self::Executed(r) => Some(r),
            Self::TransportError { .. } | Self::Skipped { .. } => None,
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Executed(r) => &r.endpoint,
            Self::TransportError { endpoint, .. } | Self::Skipped { endpoint, .. } => endpoint,
        }
    }

    #[must_use]
    pub fn method(&self) -> &str {
        match self {
            Self::Executed(r) => &r.method,
            Self::TransportError { method, .. } | Self::Skipped { method, .. } => method,
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.method(), self.endpoint())
    }
}

/// Append-only log of results with per-`(endpoint, method)` supersession.
///
/// Before a fresh attempt the caller prunes stale entries for the endpoints
/// about to run, so at most one result per endpoint is current.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ResultLog {
    entries: Vec<ExecutionResult>,
}

impl ResultLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry belonging to one of `endpoints`.
    ///
    /// Returns the number of entries removed.
    pub fn supersede(&mut self, endpoints: &[Endpoint]) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|r| !endpoints.iter().any(|ep| r.is_for(&ep.path, &ep.method)));
        before - self.entries.len()
    }

    pub fn record(&mut self, result: ExecutionResult) {
        self.entries.push(result);
    }

    pub fn extend<I: IntoIterator<Item = ExecutionResult>>(&mut self, results: I) {
        self.entries.extend(results);
    }

    /// Record `result` as the only live entry for its `(endpoint, method)`.
    pub fn replace(&mut self, result: ExecutionResult) {
        self.entries
            .retain(|r| !r.is_for(&result.endpoint, &result.method));
        self.entries.push(result);
    }

    /// Current result for an endpoint, if it has run.
    #[must_use]
    pub fn current(&self, path: &str, method: &str) -> Option<&ExecutionResult> {
        self.entries.iter().rev().find(|r| r.is_for(path, method))
    }

    #[must_use]
    pub fn results(&self) -> &[ExecutionResult] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(path: &str, method: &str, status: u16) -> ExecutionResult {
        ExecutionResult {
            endpoint: path.into(),
            method: method.into(),
            status,
            time_ms: 1.0,
            passed: status < 500,
            response: None,
            error: None,
            resolved_path: None,
            url: None,
        }
    }

    #[test]
    fn from_raw_restores_template() {
        let ep = Endpoint::new("GET", "/drivers/{driver_id}");
        let raw = RawResult {
            endpoint: "/drivers/42".into(),
            method: "GET".into(),
            status: 200,
            time_ms: 12.5,
            passed: true,
            response: Some(json!({"id": "42"})),
            error: None,
            url: Some("http://localhost/drivers/42".into()),
        };
        let r = ExecutionResult::from_raw(&ep, raw);
        assert_eq!(r.endpoint, "/drivers/{driver_id}");
        assert_eq!(r.resolved_path.as_deref(), Some("/drivers/42"));
        assert_eq!(r.label(), "GET /drivers/{driver_id}");
    }

    #[test]
    fn supersede_removes_only_matching_pairs() {
        let mut log = ResultLog::new();
        log.record(result("/drivers", "GET", 200));
        log.record(result("/drivers", "POST", 201));
        log.record(result("/vehicles", "GET", 200));

        let removed = log.supersede(&[Endpoint::new("GET", "/drivers")]);
        assert_eq!(removed, 1);
        assert_eq!(log.len(), 2);
        assert!(log.current("/drivers", "GET").is_none());
        assert!(log.current("/drivers", "POST").is_some());
    }

    #[test]
    fn replace_keeps_one_entry_per_pair() {
        let mut log = ResultLog::new();
        log.record(result("/drivers", "POST", 201));
        log.replace(result("/drivers", "GET", 500));
        log.replace(result("/drivers", "GET", 200));

        assert_eq!(log.len(), 2);
        assert_eq!(log.current("/drivers", "GET").map(|r| r.status), Some(200));
        assert!(log.current("/drivers", "POST").is_some());
    }

    #[test]
    fn current_prefers_latest_entry() {
        let mut log = ResultLog::new();
        log.record(result("/drivers", "GET", 500));
        log.record(result("/drivers", "GET", 200));
        assert_eq!(log.current("/drivers", "GET").map(|r| r.status), Some(200));
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let outcome = EndpointOutcome::TransportError {
            endpoint: "/drivers".into(),
            method: "GET".into(),
            resolved_path: "/drivers".into(),
            error: "connection refused".into(),
        };
        let v = serde_json::to_value(&outcome).unwrap();
        assert_eq!(v["outcome"], "transport_error");
        assert!(outcome.result().is_none());

        let executed = EndpointOutcome::Executed(result("/drivers", "GET", 200));
        let v = serde_json::to_value(&executed).unwrap();
        assert_eq!(v["outcome"], "executed");
        assert_eq!(v["status"], 200);
        assert_eq!(executed.label(), "GET /drivers");
    }

    #[test]
    fn log_serializes_as_plain_array() {
        let mut log = ResultLog::new();
        log.record(result("/drivers", "GET", 200));
        let v = serde_json::to_value(&log).unwrap();
        assert!(v.is_array());
        let back: ResultLog = serde_json::from_value(v).unwrap();
        assert_eq!(back, log);
    }
}
