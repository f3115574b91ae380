//! Result classification: pass, benign warning, or real failure
//!
//! Exploratory runs against arbitrary backends routinely hit legitimate
//! "nothing here" responses. Those are reachable endpoints with no data to
//! validate, not defects, so they are reported as warnings.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::result::{EndpointOutcome, ExecutionResult};

const NOT_FOUND: &str = "not found";

/// Three-way label for an executed result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Pass,
    /// Failed, but only with a not-found outcome
    Warning,
    Failure,
}

impl Classification {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Warning => "warning",
            Self::Failure => "failure",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a result is a genuine defect.
///
/// Passed results never are. A failed result is benign when the status is
/// 404, or when the serialized body or the error text mentions "not found"
/// (case-insensitive).
#[must_use]
pub fn is_real_failure(result: &ExecutionResult) -> bool {
    if result.passed || result.status == 404 {
        return false;
    }
    let body = match &result.response {
        Some(v) => serde_json::to_string(v).unwrap_or_default(),
        None => "\"\"".to_string(),
    };
    let error = result.error.as_deref().unwrap_or_default();
    !(mentions_not_found(&body) || mentions_not_found(error))
}

fn mentions_not_found(text: &str) -> bool {
    text.to_lowercase().contains(NOT_FOUND)
}

#[must_use]
pub fn classify(result: &ExecutionResult) -> Classification {
    if result.passed {
        Classification::Pass
    } else if is_real_failure(result) {
        Classification::Failure
    } else {
        Classification::Warning
    }
}

/// Results split by classification, input order kept within each group.
#[derive(Debug, Default)]
pub struct Partition<'a> {
    pub passed: Vec<&'a ExecutionResult>,
    pub warnings: Vec<&'a ExecutionResult>,
    pub failures: Vec<&'a ExecutionResult>,
}

#[must_use]
pub fn partition<'a, I>(results: I) -> Partition<'a>
where
    I: IntoIterator<Item = &'a ExecutionResult>,
{
    let mut out = Partition::default();
    for r in results {
        match classify(r) {
            Classification::Pass => out.passed.push(r),
            Classification::Warning => out.warnings.push(r),
            Classification::Failure => out.failures.push(r),
        }
    }
    out
}

/// Counts over a batch's outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Summary {
    pub total: u64,
    pub passed: u64,
    pub warnings: u64,
    pub failures: u64,
    pub transport_errors: u64,
    pub skipped: u64,
}

impl Summary {
    #[must_use]
    pub fn of<'a, I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = &'a EndpointOutcome>,
    {
        let mut s = Self::default();
        for outcome in outcomes {
            s.total += 1;
            match outcome {
                EndpointOutcome::Executed(r) => match classify(r) {
                    Classification::Pass => s.passed += 1,
                    Classification::Warning => s.warnings += 1,
                    Classification::Failure => s.failures += 1,
                },
                EndpointOutcome::TransportError { .. } => s.transport_errors += 1,
                EndpointOutcome::Skipped { .. } => s.skipped += 1,
            }
        }
        s
    }

    /// Summary over bare results (e.g. a persisted result log).
    #[must_use]
    pub fn of_results<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a ExecutionResult>,
    {
        let p = partition(results);
        let count = |v: &Vec<&ExecutionResult>| u64::try_from(v.len()).unwrap_or(u64::MAX);
        Self {
            total: count(&p.passed) + count(&p.warnings) + count(&p.failures),
            passed: count(&p.passed),
            warnings: count(&p.warnings),
            failures: count(&p.failures),
            transport_errors: 0,
            skipped: 0,
        }
    }

    #[must_use]
    pub const fn executed(&self) -> u64 {
        self.passed + self.warnings + self.failures
    }
}
