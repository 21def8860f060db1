//! Field schemas and coercion.
//!
//! A [`ResourceSchema`] is the declarative description of one configuration
//! resource: its fields, their semantic kinds, which of them sit behind an
//! edit-gate, and the cross-field rules the device enforces. The diff engine
//! iterates it generically, so adding a field to a resource means adding one
//! descriptor here and nothing else.

pub mod coerce;
pub mod field;
pub mod rules;

pub use coerce::{coerce, TypedValue};
pub use field::{FieldDescriptor, FieldKind, ResourceSchema};
pub use rules::{check_rules, ChainRule};
