//! Transport collaborator for the controller's configuration API.
//!
//! The screen only ever talks to a [`Transport`]; [`HttpTransport`] speaks
//! to a real controller and [`MemoryTransport`] simulates one in process.

pub mod http;
pub mod memory;

use async_trait::async_trait;
use serde_json::Value;
use solarcfg_core::{ChangeSet, TransportError};

pub use http::HttpTransport;
pub use memory::{Fault, MemoryTransport, RecordedRequest};

/// Fetch and submit raw configuration records
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET the resource at `path`
    async fn fetch(&self, path: &str) -> Result<Value, TransportError>;

    /// PATCH the resource at `path` with `change_set`, returning the
    /// controller's authoritative state after the update
    async fn submit(&self, path: &str, change_set: &ChangeSet) -> Result<Value, TransportError>;
}
