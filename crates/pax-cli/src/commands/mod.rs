//! Command dispatch and handler modules.

mod import_bundle;
mod move_bundle;
mod provision;
mod remove_bundle;

use miette::Result;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::ImportBundle(args) => import_bundle::exec(args),
        Command::MoveBundle {
            bundle,
            target_directory,
        } => move_bundle::exec(&bundle, &target_directory),
        Command::RemoveBundle { bundle } => remove_bundle::exec(&bundle),
        Command::Provision(args) => provision::exec(args),
    }
}

fn current_dir() -> Result<std::path::PathBuf> {
    std::env::current_dir().map_err(|e| pax_util::errors::PaxError::Io(e).into())
}
