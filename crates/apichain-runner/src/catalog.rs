//! OpenAPI catalog loading: spec file → normalized endpoint list

use std::path::Path;

use apichain_core::Endpoint;

const METHODS: &[&str] = &["get", "post", "put", "delete", "patch"];

/// Read and parse an OpenAPI spec, returning its endpoints in document order.
///
/// # Errors
///
/// Returns error if the file cannot be read, is not valid JSON/YAML, or
/// declares no operations.
pub fn load(path: &Path) -> Result<Vec<Endpoint>, CatalogError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CatalogError::Io(format!("{}: {e}", path.display())))?;
    let spec = parse_spec(path, &content)?;
    let endpoints = extract_endpoints(&spec);
    if endpoints.is_empty() {
        return Err(CatalogError::Empty(path.display().to_string()));
    }
    tracing::debug!(path = %path.display(), endpoints = endpoints.len(), "catalog loaded");
    Ok(endpoints)
}

/// Normalize every operation under `paths` into an [`Endpoint`].
///
/// Path-level parameters are merged ahead of operation-level ones.
#[must_use]
pub fn extract_endpoints(spec: &serde_json::Value) -> Vec<Endpoint> {
    let Some(paths) = spec.get("paths").and_then(|p| p.as_object()) else {
        return Vec::new();
    };

    let mut endpoints = Vec::new();
    for (path, path_item) in paths {
        for method in METHODS {
            let Some(operation) = path_item.get(*method) else {
                continue;
            };

            let parameters: Vec<serde_json::Value> =
                [path_item.get("parameters"), operation.get("parameters")]
                    .into_iter()
                    .flatten()
                    .filter_map(|p| p.as_array())
                    .flatten()
                    .cloned()
                    .collect();

            let tags = operation
                .get("tags")
                .and_then(|t| t.as_array())
                .map(|t| {
                    t.iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default();

            let text = |key: &str| {
                operation
                    .get(key)
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            };

            endpoints.push(Endpoint {
                path: path.clone(),
                method: method.to_uppercase(),
                tags,
                summary: text("summary"),
                operation_id: text("operationId"),
                parameters: if parameters.is_empty() {
                    serde_json::Value::Null
                } else {
                    serde_json::Value::Array(parameters)
                },
                request_body: operation
                    .get("requestBody")
                    .cloned()
                    .unwrap_or(serde_json::Value::Null),
            });
        }
    }
    endpoints
}

/// Parse an OpenAPI spec from JSON or YAML.
///
/// Detection strategy: try extension first (`.yaml`/`.yml`), then fall back to
/// content sniffing (leading `{` → JSON, otherwise YAML).
pub fn parse_spec(path: &Path, content: &str) -> Result<serde_json::Value, CatalogError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "yaml" | "yml" => parse_yaml(content),
        "json" => parse_json(content),
        _ if content.trim_start().starts_with('{') => parse_json(content),
        _ => parse_yaml(content),
    }
}

fn parse_json(content: &str) -> Result<serde_json::Value, CatalogError> {
    serde_json::from_str(content).map_err(|e| CatalogError::Parse(format!("Invalid JSON: {e}")))
}

fn parse_yaml(content: &str) -> Result<serde_json::Value, CatalogError> {
    serde_yml::from_str(content).map_err(|e| CatalogError::Parse(format!("Invalid YAML: {e}")))
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("No operations found in OpenAPI spec {0}")]
    Empty(String),
}
