//! Confirmed snapshots and their editable working copies.
//!
//! A [`SnapshotStore`] owns exactly one resource's state. The snapshot is
//! only ever replaced wholesale (on load or commit), so a caller holding the
//! previous snapshot can still diff against it.

pub mod store;

pub use store::{Confirmation, Snapshot, SnapshotStore, WorkingCopy};
