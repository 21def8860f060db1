//! Per-kind coercion of raw form values.
//!
//! Working copies hold whatever the operator typed (usually strings), while
//! snapshots hold what the server returned (usually numbers). Coercion maps
//! both onto a [`TypedValue`] so they can be compared semantically:
//! `"30"` and `30` are the same equalization cycle.

use crate::errors::{ReconcileError, Result};
use crate::schema::field::{FieldDescriptor, FieldKind};
use serde_json::Value;

/// A raw value parsed according to its field's kind
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Int(i64),
    Float(f64),
    Enum(String),
    Str(String),
}

impl TypedValue {
    /// Wire representation used in change-sets
    pub fn to_json(&self) -> Value {
        match self {
            TypedValue::Int(v) => Value::from(*v),
            TypedValue::Float(v) => Value::from(*v),
            TypedValue::Enum(v) | TypedValue::Str(v) => Value::String(v.clone()),
        }
    }

    /// Semantic equality against a snapshot value of the same field.
    ///
    /// The snapshot value goes through the same coercion; a snapshot value
    /// that does not coerce (or is absent) never matches, so the field is
    /// rewritten with a well-typed value.
    pub fn matches(&self, descriptor: &FieldDescriptor, snapshot: Option<&Value>) -> bool {
        let Some(snapshot) = snapshot else {
            return false;
        };
        match coerce(descriptor, snapshot) {
            Ok(other) => self.semantically_eq(&other),
            Err(_) => false,
        }
    }

    fn semantically_eq(&self, other: &TypedValue) -> bool {
        match (self, other) {
            (TypedValue::Int(a), TypedValue::Int(b)) => a == b,
            (TypedValue::Float(a), TypedValue::Float(b)) => a == b,
            (TypedValue::Enum(a), TypedValue::Enum(b)) => a == b,
            (TypedValue::Str(a), TypedValue::Str(b)) => a == b,
            _ => false,
        }
    }
}

/// Coerce `raw` according to `descriptor`.
///
/// # Errors
///
/// - `InvalidFieldValue` when the value cannot be read as the field's kind
///   (or an int falls outside its declared range)
/// - `InvalidEnumValue` when an enum value is outside the allowed set
pub fn coerce(descriptor: &FieldDescriptor, raw: &Value) -> Result<TypedValue> {
    match descriptor.kind {
        FieldKind::Int { min, max } => {
            let value = parse_int(descriptor, raw)?;
            if min.is_some_and(|m| value < m) || max.is_some_and(|m| value > m) {
                return Err(invalid(
                    descriptor,
                    raw,
                    format!(
                        "{} is outside {}..={}",
                        value,
                        min.map_or("".to_string(), |m| m.to_string()),
                        max.map_or("".to_string(), |m| m.to_string())
                    ),
                ));
            }
            Ok(TypedValue::Int(value))
        }
        FieldKind::Float => parse_float(descriptor, raw).map(TypedValue::Float),
        FieldKind::Enum(allowed) => match raw {
            Value::String(s) if allowed.contains(&s.as_str()) => Ok(TypedValue::Enum(s.clone())),
            other => Err(ReconcileError::InvalidEnumValue {
                field: descriptor.name.to_string(),
                value: match other {
                    Value::String(s) => s.clone(),
                    v => v.to_string(),
                },
                allowed: allowed.iter().map(|s| s.to_string()).collect(),
            }),
        },
        FieldKind::String => match raw {
            Value::String(s) => Ok(TypedValue::Str(s.clone())),
            Value::Number(n) => Ok(TypedValue::Str(n.to_string())),
            Value::Bool(b) => Ok(TypedValue::Str(b.to_string())),
            other => Err(invalid(descriptor, other, "expected text".to_string())),
        },
    }
}

fn parse_int(descriptor: &FieldDescriptor, raw: &Value) -> Result<i64> {
    match raw {
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                return Ok(v);
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
                    Ok(f as i64)
                }
                _ => Err(invalid(descriptor, raw, format!("{} is not an integer", n))),
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Err(invalid(descriptor, raw, "value is required".to_string()));
            }
            trimmed
                .parse::<i64>()
                .map_err(|_| invalid(descriptor, raw, format!("{:?} is not an integer", s)))
        }
        Value::Null => Err(invalid(descriptor, raw, "value is required".to_string())),
        other => Err(invalid(
            descriptor,
            raw,
            format!("{} is not an integer", other),
        )),
    }
}

fn parse_float(descriptor: &FieldDescriptor, raw: &Value) -> Result<f64> {
    let parsed = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Err(invalid(descriptor, raw, "value is required".to_string()));
            }
            trimmed.parse::<f64>().ok()
        }
        Value::Null => return Err(invalid(descriptor, raw, "value is required".to_string())),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(invalid(
            descriptor,
            raw,
            format!("{} is not a number", render(raw)),
        )),
    }
}

fn render(raw: &Value) -> String {
    match raw {
        Value::String(s) => format!("{:?}", s),
        other => other.to_string(),
    }
}

fn invalid(descriptor: &FieldDescriptor, raw: &Value, reason: String) -> ReconcileError {
    ReconcileError::InvalidFieldValue {
        field: descriptor.name.to_string(),
        raw: raw.to_string(),
        reason,
    }
}
