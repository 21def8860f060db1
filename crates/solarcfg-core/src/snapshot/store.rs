use crate::diff::{compute_change_set, ChangeSet};
use crate::errors::{ReconcileError, Result};
use crate::gate::GateState;
use crate::schema::ResourceSchema;
use serde::Serialize;
use serde_json::{Map, Value};

/// Configuration as last confirmed by the controller. Immutable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    fields: Map<String, Value>,
}

impl Snapshot {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

/// Operator's draft of a resource; values are stored raw, as typed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WorkingCopy {
    fields: Map<String, Value>,
}

impl WorkingCopy {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    fn set(&mut self, name: &str, raw: Value) {
        self.fields.insert(name.to_string(), raw);
    }
}

/// How the current snapshot was confirmed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confirmation {
    /// Fetched from the controller
    Loaded,
    /// Returned by the controller in answer to a save
    Saved,
}

#[derive(Debug, Clone)]
struct Confirmed {
    snapshot: Snapshot,
    working: WorkingCopy,
    confirmation: Confirmation,
}

/// Snapshot plus working copy of one resource
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    schema: &'static ResourceSchema,
    state: Option<Confirmed>,
}

impl SnapshotStore {
    pub fn new(schema: &'static ResourceSchema) -> Self {
        Self {
            schema,
            state: None,
        }
    }

    pub fn schema(&self) -> &'static ResourceSchema {
        self.schema
    }

    pub fn is_loaded(&self) -> bool {
        self.state.is_some()
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.state.as_ref().map(|s| &s.snapshot)
    }

    pub fn working(&self) -> Option<&WorkingCopy> {
        self.state.as_ref().map(|s| &s.working)
    }

    pub fn confirmation(&self) -> Option<Confirmation> {
        self.state.as_ref().map(|s| s.confirmation)
    }

    /// Replace snapshot and working copy with a fetched record.
    ///
    /// Returns the previous snapshot, if any.
    ///
    /// # Errors
    ///
    /// `InvalidPayload` when `raw` is not a JSON object; the store is
    /// left untouched.
    pub fn load_from(&mut self, raw: Value) -> Result<Option<Snapshot>> {
        self.replace(raw, Confirmation::Loaded)
    }

    /// Replace snapshot and working copy with the controller's answer to a
    /// save. Same contract as [`load_from`](Self::load_from).
    ///
    /// # Errors
    ///
    /// `InvalidPayload` when `raw` is not a JSON object.
    pub fn commit(&mut self, raw: Value) -> Result<Option<Snapshot>> {
        self.replace(raw, Confirmation::Saved)
    }

    fn replace(&mut self, raw: Value, confirmation: Confirmation) -> Result<Option<Snapshot>> {
        let fields = match raw {
            Value::Object(fields) => fields,
            other => {
                return Err(ReconcileError::InvalidPayload {
                    resource: self.schema.label.to_string(),
                    reason: format!("expected a JSON object, got {}", json_type(&other)),
                })
            }
        };
        let next = Confirmed {
            working: WorkingCopy {
                fields: fields.clone(),
            },
            snapshot: Snapshot { fields },
            confirmation,
        };
        Ok(self.state.replace(next).map(|prev| prev.snapshot))
    }

    /// Write a raw value into the working copy.
    ///
    /// The value is not coerced; malformed input surfaces when the
    /// change-set is computed.
    ///
    /// # Errors
    ///
    /// - `UnknownField` when `name` is not part of the schema
    /// - `NotLoaded` before the first successful load
    pub fn set_field(&mut self, name: &str, raw: Value) -> Result<()> {
        self.schema.require_field(name)?;
        let state = self.state.as_mut().ok_or_else(|| ReconcileError::NotLoaded {
            resource: self.schema.label.to_string(),
        })?;
        state.working.set(name, raw);
        Ok(())
    }

    /// True when the working copy differs from the snapshot as raw values.
    ///
    /// `"30"` over a snapshot `30` counts as dirty even though it diffs to
    /// nothing.
    pub fn is_dirty(&self) -> bool {
        self.state
            .as_ref()
            .is_some_and(|s| s.working.fields != s.snapshot.fields)
    }

    /// Reset the working copy to the snapshot
    pub fn discard(&mut self) {
        if let Some(state) = self.state.as_mut() {
            state.working.fields = state.snapshot.fields.clone();
        }
    }

    pub fn clear(&mut self) {
        self.state = None;
    }

    /// Compute the change-set of the working copy against the snapshot.
    ///
    /// # Errors
    ///
    /// `NotLoaded`, plus every error of [`compute_change_set`].
    pub fn change_set(&self, gate: &GateState) -> Result<ChangeSet> {
        let state = self.state.as_ref().ok_or_else(|| ReconcileError::NotLoaded {
            resource: self.schema.label.to_string(),
        })?;
        compute_change_set(self.schema, &state.snapshot, &state.working, gate)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
