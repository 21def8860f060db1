//! Canonical logging macros
//!
//! Every reconciliation round-trip is bracketed by exactly one start event
//! and one end (or end_error) event. Passing `ctx = &RequestContext` right
//! after the op (or after `duration_ms`) stamps the event with the
//! context's `request_id` and, when present, its `trace_id`.

/// Log the start of an operation
///
/// ```
/// # use solarcfg_core::log_op_start;
/// # use solarcfg_core_types::RequestContext;
/// log_op_start!("load");
/// log_op_start!("save", resource = "battery profile");
///
/// let ctx = RequestContext::new();
/// log_op_start!("save", ctx = &ctx, resource = "battery profile");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = solarcfg_core_types::schema::EVENT_START,
        );
    };
    ($op:expr, ctx = $ctx:expr $(, $($field:tt)*)?) => {{
        let ctx: &solarcfg_core_types::RequestContext = $ctx;
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = solarcfg_core_types::schema::EVENT_START,
            request_id = ctx.request_id.as_str(),
            trace_id = ctx.trace_id.as_ref().map(|t| t.as_str()),
            $($($field)*)?
        );
    }};
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = solarcfg_core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// ```
/// # use solarcfg_core::log_op_end;
/// log_op_end!("save", duration_ms = 42);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = solarcfg_core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, ctx = $ctx:expr $(, $($field:tt)*)?) => {{
        let ctx: &solarcfg_core_types::RequestContext = $ctx;
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = solarcfg_core_types::schema::EVENT_END,
            duration_ms = $duration,
            request_id = ctx.request_id.as_str(),
            trace_id = ctx.trace_id.as_ref().map(|t| t.as_str()),
            $($($field)*)?
        );
    }};
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = solarcfg_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error at `ERROR` level with its kind, code and message.
///
/// Accepts anything convertible into [`ExError`](crate::errors::ExError).
///
/// ```
/// # use solarcfg_core::log_op_error;
/// # use solarcfg_core::errors::ReconcileError;
/// let err = ReconcileError::NotLoaded { resource: "battery profile".to_string() };
/// log_op_error!("save", err, duration_ms = 3);
/// ```
#[macro_export]
macro_rules! log_op_error {
    (@emit $op:expr, $ex_err:expr, $duration:expr, $($field:tt)*) => {{
        let ex_err: $crate::errors::ExError = $ex_err;
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = solarcfg_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            status = ex_err.status(),
            request_id = ex_err.request_id().map(|id| id.as_str()),
            message = ex_err.message(),
            $($field)*
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {
        $crate::log_op_error!(@emit $op, $crate::errors::ExError::from($err), $duration, )
    };
    ($op:expr, $err:expr, duration_ms = $duration:expr, ctx = $ctx:expr $(, $($field:tt)*)?) => {{
        let ctx: &solarcfg_core_types::RequestContext = $ctx;
        $crate::log_op_error!(
            @emit $op,
            $crate::errors::ExError::from($err).with_request_id(ctx.request_id.clone()),
            $duration,
            trace_id = ctx.trace_id.as_ref().map(|t| t.as_str()),
            $($($field)*)?
        )
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        $crate::log_op_error!(@emit $op, $crate::errors::ExError::from($err), $duration, $($field)*)
    };
}
