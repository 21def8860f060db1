//! Change-set computation engine.
//!
//! The core entry point is [`compute_change_set`], which walks the resource
//! schema generically; no field is compared by hand.

use crate::diff::model::ChangeSet;
use crate::errors::{ReconcileError, Result};
use crate::gate::GateState;
use crate::schema::{check_rules, coerce, FieldDescriptor, ResourceSchema};
use crate::snapshot::{Snapshot, WorkingCopy};
use serde_json::{Map, Value};

/// Compute the minimal change-set of `working` against `snapshot`.
///
/// For each schema field present in the working copy:
/// 1. A value byte-equal to the snapshot value is unchanged and skipped.
/// 2. A gated field under a closed `gate` is skipped; if it differs it is
///    listed in [`ChangeSet::withheld`].
/// 3. Otherwise the value is coerced and included iff it is semantically
///    unequal to the snapshot value.
///
/// A non-empty result is checked against the schema's cross-field rules
/// with the changes overlaid on the snapshot.
///
/// # Errors
///
/// - `InvalidFieldValue` / `InvalidEnumValue` for the first malformed field
///   in schema order; nothing is produced
/// - `ConstraintViolation` when the proposed state breaks a rule
/// - `EditGateClosed` when the only differences are withheld gated fields
pub fn compute_change_set(
    schema: &ResourceSchema,
    snapshot: &Snapshot,
    working: &WorkingCopy,
    gate: &GateState,
) -> Result<ChangeSet> {
    let mut changes = Map::new();
    let mut withheld = Vec::new();

    for descriptor in schema.fields {
        let Some(raw) = working.get(descriptor.name) else {
            continue;
        };
        let current = snapshot.get(descriptor.name);
        if current == Some(raw) {
            continue;
        }

        if descriptor.gated && !gate.is_open() {
            if differs(descriptor, raw, current) {
                withheld.push(descriptor.name.to_string());
            }
            continue;
        }

        let typed = coerce(descriptor, raw)?;
        if !typed.matches(descriptor, current) {
            changes.insert(descriptor.name.to_string(), typed.to_json());
        }
    }

    if changes.is_empty() && !withheld.is_empty() {
        return Err(ReconcileError::EditGateClosed {
            resource: schema.label.to_string(),
            reason: gate.message().unwrap_or_default().to_string(),
            withheld,
        });
    }

    if !changes.is_empty() {
        let mut proposed = snapshot.fields().clone();
        proposed.extend(changes.iter().map(|(k, v)| (k.clone(), v.clone())));
        check_rules(schema, &proposed)?;
    }

    Ok(ChangeSet {
        resource: schema.name.to_string(),
        changes,
        withheld,
    })
}

/// Difference test for fields that will not be coerced into the result
fn differs(descriptor: &FieldDescriptor, raw: &Value, current: Option<&Value>) -> bool {
    match coerce(descriptor, raw) {
        Ok(typed) => !typed.matches(descriptor, current),
        Err(_) => current != Some(raw),
    }
}
