//! SolarCfg CLI
//!
//! Command-line front end to the charge controller's settings API

use clap::{Parser, Subcommand};
use solarcfg_core::errors::{ExError, ExErrorKind, ReconcileError};
use solarcfg_core::logging_facility;
use solarcfg_engine::ClientConfig;
use std::path::PathBuf;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "solarcfg")]
#[command(about = "SolarCfg - charge controller configuration", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, default_value = "solarcfg.toml")]
    config: PathBuf,

    /// Talk to an in-memory simulated controller instead of `base_url`
    #[arg(long, global = true)]
    simulate: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the confirmed state of one or all resources
    Show(commands::show::ShowArgs),
    /// Edit fields of a resource and save them
    Set(commands::set::SetArgs),
    /// Report whether charging parameters are editable
    Gate(commands::gate::GateArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let config = match ClientConfig::load(Some(&cli.config)) {
        Ok(config) => config,
        Err(e) => {
            let err = ExError::new(ExErrorKind::Configuration)
                .with_op("load_config")
                .with_message(e.to_string());
            eprintln!("Error: {}", err);
            std::process::exit(2);
        }
    };
    logging_facility::init(config.log_profile);

    let session = commands::Session {
        config,
        simulate: cli.simulate,
    };
    let result = match cli.command {
        Commands::Show(args) => commands::show::execute(&session, args).await,
        Commands::Set(args) => commands::set::execute(&session, args).await,
        Commands::Gate(args) => commands::gate::execute(&session, args).await,
    };

    if let Err(e) = result {
        match e.downcast_ref::<ReconcileError>() {
            Some(err) => eprintln!("Error [{}]: {}", err.kind().code(), err),
            None => eprintln!("Error: {}", e),
        }
        std::process::exit(1);
    }
}
