//! Centralized error types for cuprum-plugins
//!
//! Each stage of a run (locating the workspace, building, installing) has
//! its own error enum; `CliError` ties them together and decides the
//! process exit code.

use cuprum_config::ConfigError;
use cuprum_manifest::ManifestError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors locating the workspace and its plugins
#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("Workspace directory not found: {0}")]
    NotFound(PathBuf),

    #[error("Plugins directory not found: {0}")]
    PluginsDirMissing(PathBuf),

    #[error("Failed to read plugins directory {}: {source}", path.display())]
    ReadPluginsDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not determine current directory: {0}")]
    CurrentDir(#[source] io::Error),
}

/// Errors from the cargo build step
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Failed to run {}: {source}", cargo.display())]
    Spawn {
        cargo: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("build failed with exit code {code}")]
    Failed { code: i32 },

    #[error("build was terminated by a signal")]
    Terminated,
}

/// Errors while copying artifacts into the plugin directory
#[derive(Error, Debug)]
pub enum InstallError {
    #[error("Plugin '{0}' not found in the plugins directory")]
    UnknownPlugin(String),

    #[error("Failed to create plugin directory {}: {source}", path.display())]
    CreatePluginDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to copy {} to {}: {source}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to remove {}: {source}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} plugin artifact(s) not found: {}", .0.len(), join_paths(.0))]
    MissingArtifacts(Vec<PathBuf>),
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Top-level error for a CLI invocation
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Install(#[from] InstallError),

    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this error. A failed build hands back the
    /// build tool's own exit status.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Build(BuildError::Failed { code }) => *code,
            _ => 1,
        }
    }
}
