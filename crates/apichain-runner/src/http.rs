//! Blocking HTTP executor: one resolved endpoint → one request → one result

use std::collections::HashMap;
use std::time::{Duration, Instant};

use apichain_core::resolve::substitute;
use apichain_core::{Config, ExecuteError, Executor, RawResult, ResolvedEndpoint, TestData};

/// Body placeholder for responses that carried nothing.
pub const NO_DATA: &str = "No Data";

/// Sends requests with `reqwest` and reports status, timing and body.
pub struct HttpExecutor {
    client: reqwest::blocking::Client,
    base_url: String,
    headers: HashMap<String, String>,
    test_data: TestData,
}

impl HttpExecutor {
    /// # Errors
    ///
    /// Returns error if the timeout is not a positive duration or the HTTP
    /// client cannot be built.
    pub fn from_config(config: &Config, test_data: TestData) -> Result<Self, ExecuteError> {
        let timeout = Duration::try_from_secs_f64(config.timeout_secs)
            .ok()
            .filter(|t| !t.is_zero())
            .ok_or_else(|| {
                ExecuteError::InvalidRequest(format!(
                    "timeout_secs must be a positive number of seconds, got {}",
                    config.timeout_secs
                ))
            })?;
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExecuteError::Transport(e.to_string()))?;

        // Config headers win; test data headers are only a fallback.
        let headers = if config.headers.is_empty() {
            test_data.headers()
        } else {
            config.headers.clone()
        };

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            headers,
            test_data,
        })
    }

    /// Full URL for a resolved endpoint.
    ///
    /// Placeholders the run context could not fill are tried once more
    /// against this operation's test data parameters.
    #[must_use]
    pub fn url_for(&self, request: &ResolvedEndpoint<'_>) -> String {
        let params = self.test_data.parameters(request.endpoint);
        let path = substitute(request.path, |name| params.get(name).map(String::as_str));
        join_url(&self.base_url, &path)
    }
}

impl Executor for HttpExecutor {
    fn execute(&self, request: &ResolvedEndpoint<'_>) -> Result<RawResult, ExecuteError> {
        let ep = request.endpoint;
        let url = self.url_for(request);

        let method = reqwest::Method::from_bytes(ep.method.as_bytes())
            .map_err(|_| ExecuteError::InvalidRequest(format!("invalid HTTP method '{}'", ep.method)))?;

        let mut req = self.client.request(method, &url);
        for (k, v) in &self.headers {
            if reqwest::header::HeaderValue::from_str(v).is_ok() {
                req = req.header(k, v);
            }
        }
        if sends_body(&ep.method) {
            if let Some(body) = self.test_data.body(ep) {
                req = req.json(body);
            }
        }

        tracing::debug!(method = %ep.method, %url, "sending request");

        let start = Instant::now();
        let resp = req
            .send()
            .map_err(|e| ExecuteError::Transport(format!("{url}: {e}")))?;
        let time_ms = start.elapsed().as_secs_f64() * 1000.0;

        let status = resp.status().as_u16();
        let is_json = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"));
        let text = resp
            .text()
            .map_err(|e| ExecuteError::Parse(format!("{url}: {e}")))?;

        Ok(RawResult {
            endpoint: request.path.to_string(),
            method: ep.method.clone(),
            status,
            time_ms,
            passed: status < 500,
            response: Some(response_body(&text, is_json)),
            error: None,
            url: Some(url),
        })
    }
}

fn sends_body(method: &str) -> bool {
    ["POST", "PUT", "PATCH"]
        .iter()
        .any(|m| m.eq_ignore_ascii_case(method))
}

/// Join base URL and path with exactly one `/` between them.
#[must_use]
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Body as JSON when declared and parseable, text otherwise,
/// [`NO_DATA`] when empty.
///
/// Empty covers blank text and JSON `null`, `""`, `{}` and `[]`.
/// `0` and `false` are kept.
#[must_use]
pub fn response_body(text: &str, is_json: bool) -> serde_json::Value {
    use serde_json::Value;

    let no_data = || Value::String(NO_DATA.to_string());
    if text.trim().is_empty() {
        return no_data();
    }
    if is_json {
        if let Ok(v) = serde_json::from_str::<Value>(text) {
            let empty = match &v {
                Value::Null => true,
                Value::String(s) => s.is_empty(),
                Value::Array(a) => a.is_empty(),
                Value::Object(o) => o.is_empty(),
                Value::Bool(_) | Value::Number(_) => false,
            };
            return if empty { no_data() } else { v };
        }
    }
    Value::String(text.to_string())
}
