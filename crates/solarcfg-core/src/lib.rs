//! SolarCfg Core - configuration reconciliation kernel
//!
//! This crate holds the synchronous, I/O-free part of the settings screens
//! of the solar charge controller dashboard:
//! - Field schemas with per-kind coercion and cross-field voltage rules
//! - Snapshot stores pairing a confirmed snapshot with an editable working copy
//! - The diff engine producing minimal change-sets
//! - The edit-gate predicate and the cascade state machine
//! - The notification timer with token-based expiry
//!
//! Network round-trips live in `solarcfg-engine`; everything here is pure
//! state transition and can be driven from tests without a runtime.

pub mod cascade;
pub mod catalog;
pub mod diff;
pub mod errors;
pub mod gate;
pub mod logging_facility;
pub mod notification;
pub mod schema;
pub mod snapshot;

// Re-export commonly used types
pub use cascade::{CascadeCoordinator, CascadePolicy, CascadeState, CascadeStep};
pub use catalog::ResourceId;
pub use diff::{compute_change_set, ChangeSet};
pub use errors::{ExError, ExErrorKind, ReconcileError, Result, TransportError};
pub use gate::{EditGate, GateReason, GateState};
pub use notification::{Notification, NotificationKind, NotificationTimer, NotificationToken};
pub use schema::{FieldDescriptor, FieldKind, ResourceSchema, TypedValue};
pub use snapshot::{Confirmation, Snapshot, SnapshotStore, WorkingCopy};
