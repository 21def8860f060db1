//! Cross-field rules checked against a proposed configuration.
//!
//! The controller refuses voltage sets whose thresholds are out of order.
//! Checking the same chains locally turns a device round-trip into an
//! immediate form error.

use crate::errors::{ReconcileError, Result};
use crate::schema::field::ResourceSchema;
use serde_json::{Map, Value};

/// A strictly descending chain of numeric fields
#[derive(Debug, PartialEq)]
pub struct ChainRule {
    /// Rule name used in messages, e.g. `charging voltage chain`
    pub name: &'static str,
    /// `(field, short label)` pairs, highest first
    pub links: &'static [(&'static str, &'static str)],
}

impl ChainRule {
    /// Check the chain against `proposed`.
    ///
    /// Returns `None` when the chain holds or when any of its fields is
    /// absent or non-numeric (the rule then does not apply).
    pub fn violation(&self, proposed: &Map<String, Value>) -> Option<String> {
        let mut values = Vec::with_capacity(self.links.len());
        for (field, _) in self.links {
            values.push(numeric(proposed.get(*field)?)?);
        }
        let holds = values.windows(2).all(|pair| pair[0] > pair[1]);
        if holds {
            return None;
        }
        let rendered: Vec<String> = self
            .links
            .iter()
            .zip(&values)
            .map(|((_, label), value)| format!("{} ({:.2})", label, value))
            .collect();
        Some(format!("{} violated: {}", self.name, rendered.join(" > ")))
    }
}

/// Check every rule of `schema` against `proposed`, failing on the first
/// violation in declaration order.
pub fn check_rules(schema: &ResourceSchema, proposed: &Map<String, Value>) -> Result<()> {
    for rule in schema.rules {
        if let Some(detail) = rule.violation(proposed) {
            return Err(ReconcileError::ConstraintViolation {
                resource: schema.label.to_string(),
                rule: rule.name.to_string(),
                detail,
            });
        }
    }
    Ok(())
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
