//! Show command

use super::{CommandResult, Session};
use clap::Args;
use solarcfg_core::ResourceId;

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// `battery-profile` or `charging-parameters`; all when omitted
    pub resource: Option<ResourceId>,
}

pub async fn execute(session: &Session, args: ShowArgs) -> CommandResult {
    let screen = session.open().await?;
    let view = screen.view();

    let mut records = serde_json::Map::new();
    for resource in &view.resources {
        if args.resource.is_some_and(|wanted| wanted != resource.resource) {
            continue;
        }
        if let Some(snapshot) = &resource.snapshot {
            records.insert(resource.resource.to_string(), snapshot.to_value());
        }
    }

    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
