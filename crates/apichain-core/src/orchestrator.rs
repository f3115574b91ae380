//! Batch orchestration: order → resolve → execute → extract → alias → merge
//!
//! No I/O happens here. Requests go through an [`Executor`], and all
//! failure is represented as [`EndpointOutcome`] data.

use std::thread;

use crate::alias::{Aliaser, PluralStripAliaser};
use crate::context::{Identifiers, RunContext, SharedContext};
use crate::endpoint::Endpoint;
use crate::extract::extract;
use crate::order::order;
use crate::resolve::{has_unresolved, resolve};
use crate::result::{EndpointOutcome, ExecutionResult, RawResult};

/// An endpoint with its path substituted, ready to send.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedEndpoint<'a> {
    pub endpoint: &'a Endpoint,
    /// Resolved path; may still contain `{name}` spans nothing could fill
    pub path: &'a str,
}

/// Executor failure that prevented a result from being produced.
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("unreadable response: {0}")]
    Parse(String),
}

/// Single-request executor: issues one call and times it.
///
/// Retry and timeout behavior belong to the implementation.
pub trait Executor {
    /// # Errors
    ///
    /// Returns error when no status could be obtained for the request.
    fn execute(&self, request: &ResolvedEndpoint<'_>) -> Result<RawResult, ExecuteError>;
}

impl<F> Executor for F
where
    F: Fn(&ResolvedEndpoint<'_>) -> Result<RawResult, ExecuteError>,
{
    fn execute(&self, request: &ResolvedEndpoint<'_>) -> Result<RawResult, ExecuteError> {
        self(request)
    }
}

/// Progress notifications for a running batch.
pub trait RunObserver {
    fn endpoint_started(&mut self, _endpoint: &Endpoint, _resolved_path: &str) {}
    fn endpoint_finished(&mut self, _outcome: &EndpointOutcome) {}
}

impl RunObserver for () {}

/// Everything a batch produced.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// One outcome per endpoint, in execution order
    pub outcomes: Vec<EndpointOutcome>,
    /// Working context after the last endpoint
    pub context: RunContext,
}

impl BatchOutcome {
    /// Executed results only; transport errors and skips are left out.
    pub fn results(&self) -> impl Iterator<Item = &ExecutionResult> {
        self.outcomes.iter().filter_map(EndpointOutcome::result)
    }
}

/// Drives batches with a fixed aliasing strategy and skip policy.
pub struct BatchRunner {
    aliaser: Box<dyn Aliaser>,
    skip_unresolved: bool,
}

impl Default for BatchRunner {
    fn default() -> Self {
        Self {
            aliaser: Box::new(PluralStripAliaser::default()),
            skip_unresolved: false,
        }
    }
}

impl BatchRunner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_aliaser(mut self, aliaser: impl Aliaser + 'static) -> Self {
        self.aliaser = Box::new(aliaser);
        self
    }

    /// Skip endpoints whose path still has placeholders after resolution,
    /// instead of sending the literal `{name}` to the server.
    #[must_use]
    pub fn with_skip_unresolved(mut self, skip: bool) -> Self {
        self.skip_unresolved = skip;
        self
    }

    /// Run one batch sequentially against a private copy of `context`.
    ///
    /// Each call completes before the next endpoint is resolved, so a
    /// consumer always sees what earlier producers taught.
    pub fn run(
        &self,
        endpoints: &[Endpoint],
        context: &RunContext,
        executor: &(impl Executor + ?Sized),
        observer: &mut dyn RunObserver,
    ) -> BatchOutcome {
        let ordered = order(endpoints);
        let mut working = context.clone();
        let mut outcomes = Vec::with_capacity(ordered.len());

        tracing::debug!(endpoints = ordered.len(), known = working.len(), "batch started");

        for ep in &ordered {
            let outcome = self.step(ep, &mut working, executor, observer);
            observer.endpoint_finished(&outcome);
            outcomes.push(outcome);
        }

        tracing::debug!(learned = working.len(), "batch finished");

        BatchOutcome {
            outcomes,
            context: working,
        }
    }

    fn step(
        &self,
        ep: &Endpoint,
        working: &mut RunContext,
        executor: &(impl Executor + ?Sized),
        observer: &mut dyn RunObserver,
    ) -> EndpointOutcome {
        let resolved_path = resolve(&ep.path, working);
        observer.endpoint_started(ep, &resolved_path);

        if self.skip_unresolved && has_unresolved(&resolved_path) {
            tracing::warn!(endpoint = %ep.label(), path = %resolved_path, "skipped: unresolved placeholders");
            return EndpointOutcome::Skipped {
                endpoint: ep.path.clone(),
                method: ep.method.clone(),
                resolved_path,
                reason: "unresolved path placeholders".into(),
            };
        }

        let (outcome, learned) = self.execute_and_learn(ep, resolved_path, executor);
        if let Some(learned) = learned {
            working.merge(learned);
        }
        outcome
    }

    /// Execute one resolved endpoint and compute what it teaches.
    ///
    /// Learning is returned, not applied, so callers decide where it lands.
    fn execute_and_learn(
        &self,
        ep: &Endpoint,
        resolved_path: String,
        executor: &(impl Executor + ?Sized),
    ) -> (EndpointOutcome, Option<Identifiers>) {
        let request = ResolvedEndpoint {
            endpoint: ep,
            path: &resolved_path,
        };
        match executor.execute(&request) {
            Ok(raw) => {
                let result = ExecutionResult::from_raw(ep, raw);
                tracing::debug!(
                    endpoint = %result.label(),
                    path = %resolved_path,
                    status = result.status,
                    passed = result.passed,
                    time_ms = result.time_ms,
                    "endpoint executed"
                );
                let learned = result
                    .response
                    .as_ref()
                    .map(|body| self.aliaser.alias(&ep.path, extract(body)));
                (EndpointOutcome::Executed(result), learned)
            }
            Err(e) => {
                tracing::warn!(endpoint = %ep.label(), path = %resolved_path, error = %e, "endpoint failed");
                (
                    EndpointOutcome::TransportError {
                        endpoint: ep.path.clone(),
                        method: ep.method.clone(),
                        resolved_path,
                        error: e.to_string(),
                    },
                    None,
                )
            }
        }
    }

    /// Manual single-endpoint run against the live ambient context.
    ///
    /// No ordering step. Resolution uses a snapshot; only what this call
    /// learned is merged back, under the shared lock.
    pub fn run_single(
        &self,
        endpoint: &Endpoint,
        ambient: &SharedContext,
        executor: &(impl Executor + ?Sized),
    ) -> EndpointOutcome {
        let snapshot = ambient.snapshot();
        let resolved_path = resolve(&endpoint.path, &snapshot);
        let (outcome, learned) = self.execute_and_learn(endpoint, resolved_path, executor);
        if let Some(learned) = learned {
            ambient.learn(learned);
        }
        outcome
    }

    /// Run independent batches on scoped threads.
    ///
    /// Each batch snapshots the ambient context when it starts and commits
    /// its final context when it finishes (overwrite merge, no conflict
    /// detection). Outcomes come back in input order.
    pub fn run_concurrently<E>(
        &self,
        batches: &[Vec<Endpoint>],
        ambient: &SharedContext,
        executor: &E,
    ) -> Vec<BatchOutcome>
    where
        E: Executor + Sync + ?Sized,
    {
        thread::scope(|scope| {
            let handles: Vec<_> = batches
                .iter()
                .map(|batch| {
                    scope.spawn(move || {
                        let outcome = self.run(batch, &ambient.snapshot(), executor, &mut ());
                        ambient.commit(&outcome.context);
                        outcome
                    })
                })
                .collect();
            handles
                .into_iter()
                .zip(batches)
                .map(|(h, batch)| {
                    h.join().unwrap_or_else(|_| {
                        tracing::warn!(endpoints = batch.len(), "batch thread panicked");
                        BatchOutcome {
                            outcomes: Vec::new(),
                            context: RunContext::new(),
                        }
                    })
                })
                .collect()
        })
    }
}

/// Run a batch with the default aliasing strategy and no observer.
pub fn run_batch(
    endpoints: &[Endpoint],
    context: &RunContext,
    executor: &(impl Executor + ?Sized),
) -> BatchOutcome {
    BatchRunner::default().run(endpoints, context, executor, &mut ())
}
