//! Edit-gate predicate.
//!
//! A gate makes the fields of a target resource editable only while the
//! source resource's confirmed snapshot carries a required variant. The
//! decision reads the snapshot alone; the working copy only selects which
//! hint is shown to the operator.

use crate::catalog::ResourceId;
use crate::snapshot::{Snapshot, SnapshotStore, WorkingCopy};
use serde::Serialize;

/// Declarative edit-gate between two resources
#[derive(Debug, PartialEq)]
pub struct EditGate {
    pub source: ResourceId,
    pub target: ResourceId,
    /// Field of the source resource selecting the variant
    pub variant_field: &'static str,
    /// Label of `variant_field` as shown in the form
    pub variant_field_label: &'static str,
    pub required_variant: &'static str,
    pub required_variant_label: &'static str,
}

/// Why a gate is closed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum GateReason {
    /// The source resource has no confirmed snapshot
    SourceNotLoaded,
    /// The operator has not picked the required variant
    VariantNotSelected { current: Option<String> },
    /// The required variant is picked but not yet saved
    VariantNotSaved,
}

/// Evaluated gate, recomputed on every query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GateState {
    Open,
    Closed { reason: GateReason, message: String },
}

impl GateState {
    pub fn is_open(&self) -> bool {
        matches!(self, GateState::Open)
    }

    /// Operator-facing hint; `None` while open
    pub fn message(&self) -> Option<&str> {
        match self {
            GateState::Open => None,
            GateState::Closed { message, .. } => Some(message),
        }
    }

    pub fn reason(&self) -> Option<&GateReason> {
        match self {
            GateState::Open => None,
            GateState::Closed { reason, .. } => Some(reason),
        }
    }
}

impl EditGate {
    /// Gate outcome for a confirmed source snapshot
    pub fn outcome_for(&self, snapshot: Option<&Snapshot>) -> bool {
        snapshot
            .and_then(|s| s.get(self.variant_field))
            .and_then(|v| v.as_str())
            .is_some_and(|v| v == self.required_variant)
    }

    pub fn evaluate(&self, snapshot: Option<&Snapshot>, working: Option<&WorkingCopy>) -> GateState {
        if self.outcome_for(snapshot) {
            return GateState::Open;
        }
        let reason = if snapshot.is_none() {
            GateReason::SourceNotLoaded
        } else {
            let current = working
                .and_then(|w| w.get(self.variant_field))
                .and_then(|v| v.as_str());
            if current == Some(self.required_variant) {
                GateReason::VariantNotSaved
            } else {
                GateReason::VariantNotSelected {
                    current: current.map(str::to_string),
                }
            }
        };
        let message = self.message(&reason);
        GateState::Closed { reason, message }
    }

    /// Evaluate against the source resource's store
    pub fn evaluate_store(&self, source: &SnapshotStore) -> GateState {
        self.evaluate(source.snapshot(), source.working())
    }

    pub fn message(&self, reason: &GateReason) -> String {
        let target = self.target.label();
        match reason {
            GateReason::SourceNotLoaded => {
                format!("Load {} to edit {}", self.source.label(), target)
            }
            GateReason::VariantNotSelected { .. } => format!(
                "Set {} to '{}' and save to edit {}",
                self.variant_field_label, self.required_variant_label, target
            ),
            GateReason::VariantNotSaved => format!(
                "Save {} with '{}' type to edit {}",
                self.source.label(),
                self.required_variant_label,
                target
            ),
        }
    }
}
