//! Canonical schema constants for structured logging and events
//!
//! These constants keep log fields consistent between the kernel, the
//! engine and the CLI.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";
pub const FIELD_TRACE_ID: &str = "trace_id";

// Reconciliation identifiers
pub const FIELD_RESOURCE: &str = "resource";
pub const FIELD_FIELD: &str = "field";
pub const FIELD_CHANGED_FIELDS: &str = "changed_fields";
pub const FIELD_HTTP_STATUS: &str = "http_status";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

// Canonical operation names
pub const OP_LOAD: &str = "load";
pub const OP_SAVE: &str = "save";
pub const OP_CASCADE_REFRESH: &str = "cascade_refresh";
