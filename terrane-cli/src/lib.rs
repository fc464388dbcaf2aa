//! Command-line interface for importing datasets into Terrane layer stores.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};
use log::info;

mod error;
mod import;

pub use error::CliError;

use import::{ImportArgs, ImportConfig, import_dataset};

const ARG_IMPORT_STORE_DIR: &str = "store-dir";
const ARG_IMPORT_DATASET: &str = "dataset";
const ARG_IMPORT_COMMIT_INTERVAL: &str = "commit-interval";
const ENV_IMPORT_STORE_DIR: &str = "TERRANE_CMDS_IMPORT_STORE_DIR";
const ENV_IMPORT_DATASET: &str = "TERRANE_CMDS_IMPORT_DATASET";

/// Run the Terrane CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Import(args) => {
            let config = resolve_import_config(args)?;
            let report = import_dataset(&config)?;
            info!(
                "imported {} features into layer {} ({} skipped)",
                report.features_added,
                report.layer,
                report.skipped_empty + report.skipped_invalid
            );
        }
    }
    Ok(())
}

fn resolve_import_config(args: ImportArgs) -> Result<ImportConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

#[derive(Debug, Parser)]
#[command(
    name = "terrane",
    about = "Batched import of vector datasets into layered spatial stores",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import a shapefile into a layer.
    Import(ImportArgs),
}

#[cfg(test)]
mod tests;
