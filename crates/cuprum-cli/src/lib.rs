//! cuprum-plugins library
//!
//! Exposes the command implementations so the binary stays a thin shell
//! and the integration tests can reach the same code paths.

pub mod cli;
pub mod config_manager;
pub mod errors;
pub mod plugins;
pub mod workspace;

pub use cli::{Cli, Commands, ConfigAction, GlobalOpts};
pub use errors::{BuildError, CliError, InstallError, WorkspaceError};

use plugins::InstallOptions;

/// Run one parsed command line
pub fn run(cli: Cli) -> Result<(), CliError> {
    let opts = &cli.global;
    match cli.command.unwrap_or_default() {
        Commands::Build { cargo_args } => plugins::run_build(opts, &cargo_args),
        Commands::Install {
            names,
            no_build,
            cargo_args,
        } => plugins::install_plugins(
            opts,
            &InstallOptions {
                names,
                no_build,
                cargo_args,
            },
        ),
        Commands::List { json } => plugins::list_plugins(json, opts),
        Commands::Remove { name } => plugins::remove_plugin(&name, opts),
        Commands::Clean { yes } => plugins::clean_plugins(yes, opts),
        Commands::Config { action } => config_manager::handle_config(&action),
    }
}
