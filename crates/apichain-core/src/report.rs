//! Batch report: outcomes, summary and the context a batch ended with

use std::fmt::Write as _;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::classify::{Classification, Summary, classify};
use crate::context::RunContext;
use crate::orchestrator::BatchOutcome;
use crate::result::EndpointOutcome;

/// Everything worth showing or storing about one batch.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BatchReport {
    /// Suite the batch was selected from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suite: Option<String>,
    pub summary: Summary,
    pub outcomes: Vec<EndpointOutcome>,
    /// Context after the batch
    pub context: RunContext,
}

impl BatchReport {
    #[must_use]
    pub fn new(suite: Option<String>, outcome: BatchOutcome) -> Self {
        Self {
            suite,
            summary: Summary::of(&outcome.outcomes),
            outcomes: outcome.outcomes,
            context: outcome.context,
        }
    }

    /// Exit code for this batch.
    ///
    /// - 1: real failures, or warnings when `strict`
    /// - 3: nothing failed but some endpoints never produced a result
    /// - 0: otherwise
    #[must_use]
    pub const fn exit_code(&self, strict: bool) -> i32 {
        let s = &self.summary;
        if s.failures > 0 || (strict && s.warnings > 0) {
            1
        } else if s.transport_errors > 0 {
            3
        } else {
            0
        }
    }

    /// One line per endpoint plus a summary line.
    #[must_use]
    pub fn to_terminal(&self) -> String {
        let mut out = String::new();
        if let Some(suite) = &self.suite {
            let _ = writeln!(out, "Suite: {suite}");
        }
        for outcome in &self.outcomes {
            let _ = writeln!(out, "{}", outcome_line(outcome));
        }
        let s = &self.summary;
        let _ = write!(
            out,
            "\n{} endpoints: {} passed, {} warnings, {} failures, {} transport errors, {} skipped",
            s.total, s.passed, s.warnings, s.failures, s.transport_errors, s.skipped
        );
        out
    }
}

/// Terminal line for a single outcome.
#[must_use]
pub fn outcome_line(outcome: &EndpointOutcome) -> String {
    match outcome {
        EndpointOutcome::Executed(r) => {
            let tag = match classify(r) {
                Classification::Pass => "PASS ",
                Classification::Warning => "WARN ",
                Classification::Failure => "FAIL ",
            };
            let mut line = format!("{tag} {}", r.label());
            if let Some(path) = r.resolved_path.as_deref().filter(|p| *p != r.endpoint) {
                let _ = write!(line, " [{path}]");
            }
            let _ = write!(line, " -> {} ({:.0} ms)", r.status, r.time_ms);
            if let Some(err) = &r.error {
                let _ = write!(line, ": {err}");
            }
            line
        }
        EndpointOutcome::TransportError { error, .. } => {
            format!("ERROR {}: {error}", outcome.label())
        }
        EndpointOutcome::Skipped { reason, .. } => {
            format!("SKIP  {}: {reason}", outcome.label())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ExecutionResult;
    use serde_json::json;

    fn executed(path: &str, resolved: &str, status: u16, body: serde_json::Value) -> EndpointOutcome {
        EndpointOutcome::Executed(ExecutionResult {
            endpoint: path.into(),
            method: "GET".into(),
            status,
            time_ms: 12.4,
            passed: status < 400,
            response: Some(body),
            error: None,
            resolved_path: Some(resolved.into()),
            url: None,
        })
    }

    fn sample() -> BatchReport {
        let outcomes = vec![
            executed("/drivers", "/drivers", 200, json!([{"id": "42"}])),
            executed("/drivers/{driver_id}", "/drivers/42", 404, json!({"detail": "Not Found"})),
            executed("/orders/{order_id}", "/orders/42", 500, json!({"detail": "boom"})),
            EndpointOutcome::TransportError {
                endpoint: "/health".into(),
                method: "GET".into(),
                resolved_path: "/health".into(),
                error: "transport error: connection refused".into(),
            },
            EndpointOutcome::Skipped {
                endpoint: "/reports/{slug}".into(),
                method: "GET".into(),
                resolved_path: "/reports/{slug}".into(),
                reason: "unresolved path placeholders".into(),
            },
        ];
        BatchReport::new(
            Some("fleet".into()),
            BatchOutcome {
                outcomes,
                context: [("driver_id", "42")].into_iter().collect(),
            },
        )
    }

    #[test]
    fn terminal_rendering() {
        insta::assert_snapshot!(sample().to_terminal(), @r"
        Suite: fleet
        PASS  GET /drivers -> 200 (12 ms)
        WARN  GET /drivers/{driver_id} [/drivers/42] -> 404 (12 ms)
        FAIL  GET /orders/{order_id} [/orders/42] -> 500 (12 ms)
        ERROR GET /health: transport error: connection refused
        SKIP  GET /reports/{slug}: unresolved path placeholders

        5 endpoints: 1 passed, 1 warnings, 1 failures, 1 transport errors, 1 skipped
        ");
    }

    #[test]
    fn exit_codes() {
        let report = sample();
        assert_eq!(report.exit_code(false), 1);

        let mut clean = report.clone();
        clean.summary.failures = 0;
        assert_eq!(clean.exit_code(false), 3);
        assert_eq!(clean.exit_code(true), 1);

        clean.summary.transport_errors = 0;
        assert_eq!(clean.exit_code(false), 0);
    }

    #[test]
    fn json_shape() {
        let v = serde_json::to_value(sample()).unwrap();
        assert_eq!(v["suite"], "fleet");
        assert_eq!(v["summary"]["warnings"], 1);
        assert_eq!(v["outcomes"][3]["outcome"], "transport_error");
        assert_eq!(v["context"]["driver_id"], "42");
    }
}
