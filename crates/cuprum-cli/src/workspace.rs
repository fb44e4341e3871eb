//! Locating the plugin workspace and its build output

use crate::errors::WorkspaceError;
use crate::GlobalOpts;
use cuprum_config::{Config, Profile};
use cuprum_logger as logger;
use std::env;
use std::path::{Path, PathBuf};

/// A cargo workspace whose plugins directory holds one crate per plugin
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub plugins_dir: PathBuf,
    pub target_dir: PathBuf,
    pub profile: Profile,
}

impl Workspace {
    /// Resolve the workspace from, in order: `--workspace`, the `workspace`
    /// config value, or the nearest ancestor of the current directory that
    /// holds both a Cargo.toml and the plugins directory.
    pub fn resolve(opts: &GlobalOpts, config: &Config) -> Result<Self, WorkspaceError> {
        let plugins_dir_name = config.plugins_dir_name();

        let root = match opts
            .workspace
            .clone()
            .or_else(|| config.workspace.as_ref().map(PathBuf::from))
        {
            Some(root) => root,
            None => {
                let cwd = env::current_dir().map_err(WorkspaceError::CurrentDir)?;
                find_root(&cwd, plugins_dir_name).unwrap_or(cwd)
            }
        };

        if !root.is_dir() {
            return Err(WorkspaceError::NotFound(root));
        }

        let target_dir = target_dir_for(&root, env::var("CARGO_TARGET_DIR").ok().as_deref());
        let workspace = Workspace {
            plugins_dir: root.join(plugins_dir_name),
            target_dir,
            root,
            profile: Profile::from_release_flag(opts.release),
        };
        logger::debug(&format!(
            "Workspace: {} (plugins: {}, target: {}, profile: {})",
            workspace.root.display(),
            workspace.plugins_dir.display(),
            workspace.target_dir.display(),
            workspace.profile
        ));
        Ok(workspace)
    }

    /// Directory cargo writes binaries to for the active profile
    pub fn output_dir(&self) -> PathBuf {
        self.target_dir.join(self.profile.target_subdir())
    }

    /// Expected path of the built executable `bin_name`
    pub fn artifact_path(&self, bin_name: &str) -> PathBuf {
        self.output_dir().join(artifact_file_name(bin_name))
    }
}

/// File name of an executable on this platform
pub fn artifact_file_name(bin_name: &str) -> String {
    format!("{}{}", bin_name, env::consts::EXE_SUFFIX)
}

/// Walk up from `start` to the first directory with a Cargo.toml and a
/// `plugins_dir_name` subdirectory.
pub fn find_root(start: &Path, plugins_dir_name: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join("Cargo.toml").is_file() && dir.join(plugins_dir_name).is_dir())
        .map(Path::to_path_buf)
}

/// `CARGO_TARGET_DIR` if set and non-empty (relative values are taken from
/// the workspace root, where cargo runs), else `<root>/target`.
fn target_dir_for(root: &Path, env_value: Option<&str>) -> PathBuf {
    match env_value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => root.join(value),
        None => root.join("target"),
    }
}
