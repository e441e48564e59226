//! JSON Schema validation of configuration documents
//!
//! Catches structural mistakes (a list where a map belongs, a string where a
//! number belongs) with a path into the document before typed decoding.

use crate::error::ConfigError;
use anyhow::{Result, anyhow};
use jsonschema::{Draft, Validator};
use serde_json::Value;

/// Get the embedded JSON schema for configuration documents
///
/// # Errors
///
/// Returns an error if the embedded schema does not parse or compile.
pub fn get_schema() -> Result<Validator> {
    let schema_str = include_str!("../../docs/schema.json");
    let schema: Value = serde_json::from_str(schema_str)
        .map_err(|e| anyhow!("Failed to parse embedded JSON schema: {e}"))?;

    jsonschema::options()
        .with_draft(Draft::Draft7)
        .build(&schema)
        .map_err(|e| anyhow!("Failed to compile JSON schema: {e}"))
}

/// Validate a parsed YAML document against the schema
///
/// # Errors
///
/// Returns [`ConfigError::Schema`] listing every violation.
pub fn validate_document(document: &serde_yaml::Value, origin: &str) -> Result<()> {
    let instance = serde_json::to_value(document)
        .map_err(|e| ConfigError::schema(origin, format!("  - document cannot be represented as JSON: {e}")))?;

    let schema = get_schema()?;
    let error_messages: Vec<String> = schema
        .iter_errors(&instance)
        .map(|e| format!("  - {e}"))
        .collect();

    if !error_messages.is_empty() {
        return Err(ConfigError::schema(origin, error_messages.join("\n")).into());
    }
    Ok(())
}
