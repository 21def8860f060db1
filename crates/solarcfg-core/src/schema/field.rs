use crate::errors::{ReconcileError, Result};
use crate::schema::coerce::{coerce, TypedValue};
use crate::schema::rules::ChainRule;
use serde_json::Value;

/// Semantic type of a configuration field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    /// Whole number, optionally bounded (inclusive)
    Int { min: Option<i64>, max: Option<i64> },
    /// Finite floating point number
    Float,
    /// One of a fixed set of strings
    Enum(&'static [&'static str]),
    /// Free text
    String,
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Int { .. } => "int",
            FieldKind::Float => "float",
            FieldKind::Enum(_) => "enum",
            FieldKind::String => "string",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldKind::Int { .. } | FieldKind::Float)
    }
}

/// Static description of one editable field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Editable only while the resource's edit-gate is open
    pub gated: bool,
}

impl FieldDescriptor {
    pub const fn int(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Int {
                min: None,
                max: None,
            },
            gated: false,
        }
    }

    pub const fn int_range(name: &'static str, min: i64, max: i64) -> Self {
        Self {
            name,
            kind: FieldKind::Int {
                min: Some(min),
                max: Some(max),
            },
            gated: false,
        }
    }

    pub const fn float(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Float,
            gated: false,
        }
    }

    pub const fn enumeration(name: &'static str, allowed: &'static [&'static str]) -> Self {
        Self {
            name,
            kind: FieldKind::Enum(allowed),
            gated: false,
        }
    }

    pub const fn string(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::String,
            gated: false,
        }
    }

    pub const fn gated(self) -> Self {
        Self {
            gated: true,
            ..self
        }
    }
}

/// Declarative description of a configuration resource
#[derive(Debug, PartialEq)]
pub struct ResourceSchema {
    /// Path segment under the API prefix, e.g. `battery-profile`
    pub name: &'static str,
    /// Human-readable name used in notifications, e.g. `battery profile`
    pub label: &'static str,
    pub fields: &'static [FieldDescriptor],
    pub rules: &'static [ChainRule],
}

impl ResourceSchema {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a field, failing with `UnknownField`
    pub fn require_field(&self, name: &str) -> Result<&FieldDescriptor> {
        self.field(name).ok_or_else(|| ReconcileError::UnknownField {
            resource: self.label.to_string(),
            field: name.to_string(),
        })
    }

    /// Coerce a raw value for the named field
    pub fn coerce(&self, name: &str, raw: &Value) -> Result<TypedValue> {
        coerce(self.require_field(name)?, raw)
    }

    pub fn has_gated_fields(&self) -> bool {
        self.fields.iter().any(|f| f.gated)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }
}
