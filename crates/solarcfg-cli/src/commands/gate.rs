//! Gate command

use super::{CommandResult, Session};
use clap::Args;
use solarcfg_core::GateState;

#[derive(Debug, Args)]
pub struct GateArgs {}

pub async fn execute(session: &Session, _args: GateArgs) -> CommandResult {
    let screen = session.open().await?;

    for resource in screen.view().resources {
        match resource.gate {
            Some(GateState::Open) => println!("{}: open", resource.resource),
            Some(GateState::Closed { message, .. }) => {
                println!("{}: closed ({})", resource.resource, message)
            }
            None => {}
        }
    }
    Ok(())
}
