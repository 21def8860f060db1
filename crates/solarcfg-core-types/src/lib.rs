//! Core types shared across SolarCfg facilities
//!
//! This crate provides the foundational types used by both the error
//! facility and the logging facility:
//!
//! - **Correlation types**: RequestId, TraceId, RequestContext
//! - **Schema constants**: canonical field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::{RequestContext, RequestId, TraceId};
