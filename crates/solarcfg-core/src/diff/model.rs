//! Change-set output type.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Minimal field-level diff of one resource, ready for submission.
///
/// Values are coerced to their field's kind, so `"30"` typed into an int
/// field is submitted as `30`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangeSet {
    /// Resource name, e.g. `battery-profile`
    pub resource: String,
    /// Changed fields with their coerced values, keyed by field name
    pub changes: Map<String, Value>,
    /// Gated fields that differ but were left out because the gate is closed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub withheld: Vec<String>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.changes.contains_key(field)
    }

    /// Request body for the PATCH
    pub fn to_payload(&self) -> Value {
        Value::Object(self.changes.clone())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.changes.keys().map(String::as_str)
    }
}
