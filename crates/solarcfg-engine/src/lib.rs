//! SolarCfg Engine - round-trip orchestration
//!
//! Connects the reconciliation kernel in `solarcfg-core` to the controller:
//! - [`Transport`] with an HTTP implementation and an in-memory simulator
//! - [`ConfigScreen`], the settings-page controller (load, save, cascade)
//! - [`Notifier`], the runtime driver of the notification timer
//! - [`ClientConfig`], layered client configuration

pub mod config;
pub mod notifier;
pub mod screen;
pub mod transport;

pub use config::ClientConfig;
pub use notifier::{Notifier, TokioClock};
pub use screen::{CascadeView, ConfigScreen, ResourceView, SaveOutcome, ScreenView};
pub use transport::{Fault, HttpTransport, MemoryTransport, RecordedRequest, Transport};
