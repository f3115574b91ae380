//! JSON Schema for the report interchange format
//!
//! `apichain run --output json` prints a list of [`BatchReport`] values;
//! this schema lets other tools consume them without reading Rust types.

use crate::report::BatchReport;

/// Generate JSON Schema for [`BatchReport`].
#[must_use]
pub fn generate_schema() -> String {
    let schema = schemars::schema_for!(BatchReport);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_generation_produces_valid_json() {
        let schema = generate_schema();
        let parsed: serde_json::Value = serde_json::from_str(&schema).unwrap();
        assert!(parsed.get("$schema").is_some() || parsed.get("type").is_some());
        assert_eq!(
            parsed.get("title").and_then(|v| v.as_str()),
            Some("BatchReport")
        );
    }

    #[test]
    fn schema_names_outcome_variants() {
        let schema = generate_schema();
        assert!(schema.contains("transport_error"));
        assert!(schema.contains("skipped"));
    }
}
