use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Build the cuprum plugin workspace and install each plugin binary into
/// the local plugin directory.
///
/// Running without a command is the same as `cuprum-plugins install`.
#[derive(Parser, Debug)]
#[command(name = "cuprum-plugins", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// More output (-v for details, -vv for debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Workspace root containing Cargo.toml and the plugins directory
    #[arg(long, value_name = "DIR", global = true)]
    pub workspace: Option<PathBuf>,

    /// Use the release profile (target/release, ~/.cuprum/plugins)
    #[arg(long, global = true)]
    pub release: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build every workspace member with cargo
    Build {
        /// Extra arguments passed to `cargo build` after `--`
        #[arg(last = true, value_name = "CARGO_ARGS")]
        cargo_args: Vec<String>,
    },

    /// Build, then copy each plugin binary into the plugin directory
    Install {
        /// Only install these plugins (default: all)
        #[arg(value_name = "NAME")]
        names: Vec<String>,

        /// Skip the build step and copy existing artifacts
        #[arg(long)]
        no_build: bool,

        /// Extra arguments passed to `cargo build` after `--`
        #[arg(last = true, value_name = "CARGO_ARGS")]
        cargo_args: Vec<String>,
    },

    /// Show plugins with their build and install status
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Remove an installed plugin from the plugin directory
    Remove {
        /// Plugin or artifact name
        name: String,
    },

    /// Remove every plugin this tool installed for the active profile
    Clean {
        /// Actually delete files
        #[arg(short, long)]
        yes: bool,
    },

    /// Inspect or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print all configured values
    Show,
    /// Print the config file location
    Path,
    /// Print one value
    Get { key: String },
    /// Set one value
    Set { key: String, value: String },
    /// Delete the config file
    Reset,
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Install {
            names: Vec::new(),
            no_build: false,
            cargo_args: Vec::new(),
        }
    }
}
