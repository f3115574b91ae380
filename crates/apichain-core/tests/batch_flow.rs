//! End-to-end batch behavior against an in-memory executor

use std::collections::HashMap;
use std::sync::Mutex;

use apichain_core::{
    BatchReport, BatchRunner, Classification, Endpoint, EndpointOutcome, ExecuteError, Executor,
    RawResult, ResolvedEndpoint, ResultLog, RunContext, SharedContext, Summary, classify,
    run_batch,
};
use serde_json::{Value, json};

/// Fake backend: `METHOD path` → (status, body). Unknown routes return 404.
///
/// Only 2xx counts as passed, so a 404 reaches the classifier as a failed call.
struct FakeApi {
    routes: HashMap<String, (u16, Value)>,
    calls: Mutex<Vec<String>>,
}

impl FakeApi {
    fn new(routes: &[(&str, u16, Value)]) -> Self {
        Self {
            routes: routes
                .iter()
                .map(|(k, s, b)| ((*k).to_string(), (*s, b.clone())))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Executor for FakeApi {
    fn execute(&self, request: &ResolvedEndpoint<'_>) -> Result<RawResult, ExecuteError> {
        let key = format!("{} {}", request.endpoint.method, request.path);
        self.calls.lock().unwrap().push(key.clone());
        if request.path.contains("/offline") {
            return Err(ExecuteError::Transport("connection refused".into()));
        }
        let (status, body) = self
            .routes
            .get(&key)
            .cloned()
            .unwrap_or((404, json!({"detail": "Not Found"})));
        Ok(RawResult {
            endpoint: request.path.to_string(),
            method: request.endpoint.method.clone(),
            status,
            time_ms: 5.0,
            passed: (200..300).contains(&status),
            response: Some(body),
            error: None,
            url: Some(format!("http://api.test{}", request.path)),
        })
    }
}

#[test]
fn drivers_list_feeds_driver_detail() {
    let api = FakeApi::new(&[
        ("GET /drivers", 200, json!({"id": "42", "name": "Amy"})),
        ("GET /drivers/42", 200, json!({"id": "42", "name": "Amy"})),
    ]);
    let endpoints = vec![
        Endpoint::new("GET", "/drivers"),
        Endpoint::new("GET", "/drivers/{driver_id}"),
    ];

    let out = run_batch(&endpoints, &RunContext::new(), &api);

    assert_eq!(api.calls(), vec!["GET /drivers", "GET /drivers/42"]);
    assert_eq!(out.context.get("driver_id"), Some("42"));
    assert_eq!(out.context.get("driverId"), Some("42"));
    assert_eq!(out.context.get("name"), Some("Amy"));

    let detail = out.results().nth(1).unwrap();
    assert_eq!(detail.endpoint, "/drivers/{driver_id}");
    assert!(detail.passed);
}

#[test]
fn consumers_listed_first_still_run_last() {
    let api = FakeApi::new(&[
        ("GET /fleets", 200, json!([{"id": "f1"}, {"id": "f2"}])),
        ("GET /fleets/f1/vehicles", 200, json!([{"uuid": "v9", "plate": "X-1"}])),
        ("GET /fleets/f1/vehicles/v9", 200, json!({"uuid": "v9"})),
    ]);
    let endpoints = vec![
        Endpoint::new("GET", "/fleets/{fleet_id}/vehicles/{vehicle_id}"),
        Endpoint::new("GET", "/fleets/{fleet_id}/vehicles"),
        Endpoint::new("GET", "/fleets"),
    ];

    let out = run_batch(&endpoints, &RunContext::new(), &api);

    // Two-bucket ordering: only /fleets moves; consumers keep their order,
    // so the detail call runs before the vehicle list has taught vehicle_id.
    assert_eq!(
        api.calls(),
        vec![
            "GET /fleets",
            "GET /fleets/f1/vehicles/f1",
            "GET /fleets/f1/vehicles",
        ]
    );
    assert_eq!(out.context.get("fleet_id"), Some("f1"));
    assert_eq!(out.context.get("vehicle_id"), Some("v9"));
    assert_eq!(out.context.get("plate"), Some("X-1"));
}

#[test]
fn failures_and_warnings_are_data() {
    let api = FakeApi::new(&[
        ("GET /drivers", 200, json!([])),
        ("POST /drivers", 500, json!({"detail": "Internal error"})),
    ]);
    let endpoints = vec![
        Endpoint::new("GET", "/drivers"),
        Endpoint::new("POST", "/drivers"),
        Endpoint::new("GET", "/drivers/{driver_id}"),
        Endpoint::new("GET", "/offline"),
    ];

    let out = run_batch(&endpoints, &RunContext::new(), &api);
    let report = BatchReport::new(None, out);

    assert_eq!(
        report.summary,
        Summary {
            total: 4,
            passed: 1,
            warnings: 1,
            failures: 1,
            transport_errors: 1,
            skipped: 0,
        }
    );
    assert!(matches!(
        report.outcomes.iter().find(|o| o.endpoint() == "/offline"),
        Some(EndpointOutcome::TransportError { .. })
    ));

    // Nothing taught driver_id, so the detail call went out unresolved and 404'd.
    let detail = report
        .outcomes
        .iter()
        .filter_map(EndpointOutcome::result)
        .find(|r| r.endpoint == "/drivers/{driver_id}")
        .unwrap();
    assert_eq!(detail.status, 404);
    assert!(!detail.passed);
    assert_eq!(classify(detail), Classification::Warning);

    assert_eq!(report.exit_code(false), 1);
}

#[test]
fn not_found_in_body_downgrades_server_error() {
    let api = FakeApi::new(&[(
        "DELETE /drivers",
        500,
        json!({"detail": "Driver Not Found"}),
    )]);
    let endpoints = vec![Endpoint::new("DELETE", "/drivers")];

    let report = BatchReport::new(None, run_batch(&endpoints, &RunContext::new(), &api));

    assert_eq!(report.summary.warnings, 1);
    assert_eq!(report.summary.failures, 0);
    assert_eq!(report.exit_code(false), 0);
    assert_eq!(report.exit_code(true), 1);
}

#[test]
fn result_log_keeps_one_live_entry_per_endpoint() {
    let api = FakeApi::new(&[("GET /drivers", 200, json!({"id": "1"}))]);
    let endpoints = vec![Endpoint::new("GET", "/drivers")];
    let mut log = ResultLog::new();

    for _ in 0..3 {
        log.supersede(&endpoints);
        let out = run_batch(&endpoints, &RunContext::new(), &api);
        log.extend(out.results().cloned());
    }

    assert_eq!(log.len(), 1);
    assert!(log.current("/drivers", "GET").is_some());
}

#[test]
fn concurrent_batches_merge_on_completion() {
    let api = FakeApi::new(&[
        ("GET /drivers", 200, json!({"id": "d1"})),
        ("GET /drivers/d1", 200, json!({"license": "L"})),
        ("GET /vehicles", 200, json!({"id": "v1"})),
        ("GET /vehicles/v1", 200, json!({"vin": "VIN"})),
    ]);
    let ambient = SharedContext::new([("tenant", "acme")].into_iter().collect());
    let batches = vec![
        vec![
            Endpoint::new("GET", "/drivers"),
            Endpoint::new("GET", "/drivers/{driver_id}"),
        ],
        vec![
            Endpoint::new("GET", "/vehicles"),
            Endpoint::new("GET", "/vehicles/{vehicle_id}"),
        ],
    ];

    let outs = BatchRunner::new().run_concurrently(&batches, &ambient, &api);

    assert_eq!(outs.len(), 2);
    assert!(outs.iter().all(|o| o.results().all(|r| r.passed)));
    let ctx = ambient.snapshot();
    assert_eq!(ctx.get("tenant"), Some("acme"));
    assert_eq!(ctx.get("driver_id"), Some("d1"));
    assert_eq!(ctx.get("vehicle_id"), Some("v1"));
    assert_eq!(ctx.get("license"), Some("L"));
    assert_eq!(ctx.get("vin"), Some("VIN"));
}

#[test]
fn manual_run_learns_into_ambient() {
    let api = FakeApi::new(&[("GET /drivers", 200, json!([{"id": "7"}]))]);
    let ambient = SharedContext::default();

    let outcome = BatchRunner::new().run_single(&Endpoint::new("GET", "/drivers"), &ambient, &api);

    assert!(outcome.result().is_some());
    assert_eq!(ambient.snapshot().get("driver_id"), Some("7"));
}
