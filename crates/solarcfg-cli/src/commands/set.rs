//! Set command
//!
//! Each `name=value` assignment is written into the working copy exactly as
//! typed, the way a form field holds text; coercion happens when the
//! change-set is built.

use super::{CommandResult, Session};
use clap::Args;
use serde_json::Value;
use solarcfg_core::diff::render_change_summary;
use solarcfg_core::ResourceId;
use solarcfg_engine::SaveOutcome;

#[derive(Debug, Args)]
pub struct SetArgs {
    /// `battery-profile` or `charging-parameters`
    pub resource: ResourceId,

    /// Field assignments, e.g. `batteryCapacity=200`
    #[arg(required = true, value_parser = parse_assignment)]
    pub assignments: Vec<(String, String)>,

    /// Print the change summary without saving
    #[arg(long)]
    pub dry_run: bool,
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected name=value, got '{}'", s)),
    }
}

pub async fn execute(session: &Session, args: SetArgs) -> CommandResult {
    let screen = session.open().await?;
    for (name, value) in &args.assignments {
        screen.set_field(args.resource, name, Value::String(value.clone()))?;
    }

    let change_set = screen.preview(args.resource)?;
    let view = screen.view();
    let snapshot = view
        .resource(args.resource)
        .and_then(|r| r.snapshot.as_ref())
        .ok_or("resource not loaded")?;
    print!(
        "{}",
        render_change_summary(args.resource.schema(), snapshot, &change_set)
    );
    if args.dry_run {
        return Ok(());
    }

    match screen.save(args.resource).await? {
        SaveOutcome::NoChanges => {}
        SaveOutcome::Saved { refreshed, .. } => {
            for resource in refreshed {
                println!("refreshed {}", resource);
            }
            if let Some(notification) = screen.notification() {
                println!("{}", notification.message);
            }
        }
    }
    Ok(())
}
