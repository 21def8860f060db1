//! Subcommands

pub mod gate;
pub mod set;
pub mod show;

use solarcfg_engine::{ClientConfig, ConfigScreen, HttpTransport, MemoryTransport, Transport};
use std::sync::Arc;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Settings shared by every subcommand
pub struct Session {
    pub config: ClientConfig,
    pub simulate: bool,
}

impl Session {
    /// Build a screen over the configured controller and mount it
    pub async fn open(&self) -> Result<ConfigScreen, Box<dyn std::error::Error>> {
        let transport: Arc<dyn Transport> = if self.simulate {
            Arc::new(MemoryTransport::new(&self.config.api_prefix))
        } else {
            Arc::new(HttpTransport::from_config(&self.config)?)
        };
        let screen = ConfigScreen::new(transport, &self.config);
        screen.mount().await?;
        Ok(screen)
    }
}
