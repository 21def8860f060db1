//! Change-set computation.
//!
//! Compares a resource's working copy with its confirmed snapshot and
//! produces the minimal set of fields to submit.
//!
//! ## Entry point
//!
//! ```
//! use solarcfg_core::catalog::BATTERY_PROFILE;
//! use solarcfg_core::diff::render_change_summary;
//! use solarcfg_core::{GateState, SnapshotStore};
//! use serde_json::json;
//!
//! let mut store = SnapshotStore::new(&BATTERY_PROFILE);
//! store.load_from(json!({"batteryType": "sealed", "batteryCapacity": 100})).unwrap();
//! store.set_field("batteryType", json!("userDefined")).unwrap();
//!
//! let change_set = store.change_set(&GateState::Open).unwrap();
//! assert_eq!(change_set.to_payload(), json!({"batteryType": "userDefined"}));
//!
//! let summary = render_change_summary(&BATTERY_PROFILE, store.snapshot().unwrap(), &change_set);
//! assert_eq!(summary, "batteryType: sealed → userDefined\n");
//! ```
//!
//! ## Guarantees
//!
//! - A working copy equal to its snapshot yields an empty change-set.
//! - Coercion is all-or-nothing: one malformed field fails the whole set.
//! - Gated fields never appear in a change-set while their gate is closed.

pub mod engine;
pub mod human_summary;
pub mod model;

pub use engine::compute_change_set;
pub use human_summary::render_change_summary;
pub use model::ChangeSet;
