// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure functions over workflow definitions and evidence submissions:
//! schema collection, structural validation, and diagnostics retention.
//! Nothing here touches the store or the bus.

use indexmap::IndexMap;
use loom_core::{Gate, HistoryEntry, StateDefinition, WorkflowDefinition};
use serde_json::Value;

/// One agent state's evidence schema, as collected by [`collect_schemas`].
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaEntry {
    pub workflow: String,
    pub state: String,
    pub schema: IndexMap<String, String>,
}

/// Every agent state with an evidence gate contributes one entry, in
/// declaration order.
pub fn collect_schemas(definitions: &[&WorkflowDefinition]) -> Vec<SchemaEntry> {
    let mut entries = Vec::new();
    for definition in definitions {
        for (state_name, state) in &definition.states {
            if let Some(Gate::Evidence { schema, .. }) = state.gate() {
                entries.push(SchemaEntry {
                    workflow: definition.name.clone(),
                    state: state_name.clone(),
                    schema: schema.clone(),
                });
            }
        }
    }
    entries
}

/// The result of validating one evidence submission against a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub state: String,
    pub ok: bool,
    pub errors: Vec<String>,
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
        Value::Null => "null",
    }
}

fn matches_type(value: &Value, type_name: &str) -> bool {
    match type_name {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        // Opaque type names (e.g. "string[]") are reserved for future
        // extension and pass through unchecked — see Open Questions.
        _ => true,
    }
}

/// Validate `evidence` against `schema`. Errors preserve the schema's
/// declaration order, so diagnostics read in the order a workflow author
/// wrote the fields.
pub fn validate_evidence(
    state: &str,
    schema: &IndexMap<String, String>,
    evidence: &Value,
) -> ValidationReport {
    let mut errors = Vec::new();
    for (key, type_name) in schema {
        match evidence.get(key) {
            None => errors.push(format!("missing key: {key}")),
            Some(value) => {
                if !matches_type(value, type_name) {
                    errors.push(format!(
                        "type mismatch for {key}: expected {type_name}, got {}",
                        kind_name(value)
                    ));
                }
            }
        }
    }
    ValidationReport {
        state: state.to_string(),
        ok: errors.is_empty(),
        errors,
    }
}

/// One entry per history entry: `{state, ok, errors}`. `errors` is
/// recovered from `evidence[state].validation_errors` if present and
/// shaped as a sequence of strings, else empty.
pub fn build_diagnostics(
    history: &[HistoryEntry],
    evidence: &std::collections::HashMap<String, Value>,
) -> Vec<ValidationReport> {
    history
        .iter()
        .map(|entry| {
            let errors = evidence
                .get(&entry.state)
                .and_then(|v| v.get("validation_errors"))
                .and_then(|v| v.as_array())
                .map(|arr| {
                    arr.iter()
                        .filter_map(|e| e.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default();
            let ok = errors.is_empty();
            ValidationReport {
                state: entry.state.clone(),
                ok,
                errors,
            }
        })
        .collect()
}

/// Resolve the state's gate-declared schema, if it has an evidence gate.
pub fn schema_for_state(state: &StateDefinition) -> Option<&IndexMap<String, String>> {
    match state.gate() {
        Some(Gate::Evidence { schema, .. }) => Some(schema),
        _ => None,
    }
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
