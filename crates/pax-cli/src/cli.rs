//! CLI argument definitions.
//!
//! Each subcommand corresponds to a handler in [`super::commands`].

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "pax-construct",
    version,
    about = "Manage OSGi bundle modules in a Maven project",
    long_about = "pax-construct imports bundles from Maven repositories into a project, \
                  moves and removes bundle modules while keeping the POM tree wired, \
                  and provisions the project's bundles onto an OSGi framework."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import a bundle and its provided dependencies
    #[command(name = "import-bundle")]
    ImportBundle(ImportArgs),

    /// Move a bundle module to another directory of the project
    #[command(name = "move-bundle")]
    MoveBundle {
        /// Module directory, artifactId or symbolic name
        bundle: String,
        /// New parent directory; missing aggregators are created
        target_directory: PathBuf,
    },

    /// Delete a bundle module and every reference to it
    #[command(name = "remove-bundle")]
    RemoveBundle {
        /// Module directory, artifactId or symbolic name
        bundle: String,
    },

    /// Collect the project's bundles and deploy them with the runner
    Provision(ProvisionArgs),
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Root artifact as group:artifact:version
    pub coordinate: String,

    /// Module name of the provisioning manifest (default from config)
    #[arg(long)]
    pub provision_id: Option<String>,

    /// Module directory to import into
    #[arg(long, default_value = ".")]
    pub target_directory: PathBuf,

    /// Stop at the first bundle found
    #[arg(long)]
    pub exclude_transitive: bool,

    /// Follow compile and runtime dependencies as if they were provided
    #[arg(long)]
    pub widen_scope: bool,

    /// Open artifact jars to look for OSGi headers
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub test_metadata: bool,

    /// Record imports as deployable (non-optional)
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub deploy: bool,

    /// Replace existing dependency entries
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub overwrite: bool,

    /// Use only the local repository
    #[arg(long)]
    pub offline: bool,
}

#[derive(Args, Debug)]
pub struct ProvisionArgs {
    /// OSGi framework to deploy onto (default from config)
    #[arg(long)]
    pub framework: Option<String>,

    /// Launch the runner after writing the deployment POM
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub deploy: bool,

    /// Extra POM files whose bundles are deployed too
    #[arg(long, value_delimiter = ',')]
    pub deploy_poms: Vec<PathBuf>,

    /// Runner version, selects its command-line dialect (default from config)
    #[arg(long)]
    pub runner: Option<String>,
}

/// Parse CLI arguments from the process environment.
pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definitions_are_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn boolean_flags_default_to_true() {
        let cli = Cli::parse_from(["pax-construct", "import-bundle", "g:a:1"]);
        let Command::ImportBundle(args) = cli.command else {
            panic!("expected import-bundle");
        };
        assert!(args.test_metadata && args.deploy && args.overwrite);
        assert!(!args.widen_scope);

        let cli = Cli::parse_from(["pax-construct", "import-bundle", "g:a:1", "--deploy", "false"]);
        let Command::ImportBundle(args) = cli.command else {
            panic!("expected import-bundle");
        };
        assert!(!args.deploy);
    }

    #[test]
    fn deploy_poms_split_on_commas() {
        let cli = Cli::parse_from(["pax-construct", "provision", "--deploy-poms", "a.xml,b/pom.xml"]);
        let Command::Provision(args) = cli.command else {
            panic!("expected provision");
        };
        assert_eq!(args.deploy_poms, vec![PathBuf::from("a.xml"), PathBuf::from("b/pom.xml")]);
    }
}
