use cuprum_logger as logger;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use which::which;

/// Environment variable that overrides the config file location
pub const CONFIG_ENV: &str = "CUPRUM_PLUGINS_CONFIG";

const DEFAULT_PLUGINS_DIR: &str = "plugins";

/// Keys accepted by `config get` / `config set`
pub const KEYS: &[&str] = &["workspace", "plugins-dir", "plugin-dir", "cargo-path"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Unknown config key '{0}' (expected one of: {keys})", keys = KEYS.join(", "))]
    UnknownKey(String),

    #[error("plugin-dir must be an absolute path below some directory, got '{0}'")]
    InvalidPluginDir(String),

    #[error("Could not determine home directory")]
    NoHomeDir,

    #[error("cargo not found on PATH; set it with `cuprum-plugins config set cargo-path <PATH>`")]
    CargoNotFound,
}

/// Build profile. Selects both the cargo output directory and the install
/// destination the host application reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    Debug,
    Release,
}

impl Profile {
    pub fn from_release_flag(release: bool) -> Self {
        if release {
            Profile::Release
        } else {
            Profile::Debug
        }
    }

    /// Directory name under the cargo target dir
    pub fn target_subdir(self) -> &'static str {
        match self {
            Profile::Debug => "debug",
            Profile::Release => "release",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.target_subdir())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugins_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cargo_path: Option<String>,
}

impl Config {
    pub fn path() -> Result<PathBuf, ConfigError> {
        // Explicit override for tests and isolated runs.
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                return Ok(PathBuf::from(trimmed));
            }
        }

        #[cfg(not(target_os = "windows"))]
        let base = dirs::home_dir()
            .ok_or(ConfigError::NoHomeDir)?
            .join(".config");

        #[cfg(target_os = "windows")]
        let base = dirs::config_dir().ok_or(ConfigError::NoHomeDir)?;

        Ok(base.join("cuprum").join("cuprum-plugins.toml"))
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn reset() -> Result<(), ConfigError> {
        let path = Self::path()?;
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let value = match key {
            "workspace" => &self.workspace,
            "plugins-dir" => &self.plugins_dir,
            "plugin-dir" => &self.plugin_dir,
            "cargo-path" => &self.cargo_path,
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        };
        Ok(value.clone())
    }

    pub fn set(&mut self, key: &str, value: String) -> Result<(), ConfigError> {
        let slot = match key {
            "workspace" => &mut self.workspace,
            "plugins-dir" => &mut self.plugins_dir,
            "plugin-dir" => &mut self.plugin_dir,
            "cargo-path" => &mut self.cargo_path,
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        };
        if key == "plugin-dir" {
            check_plugin_dir(&value)?;
        }
        *slot = Some(value);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.workspace.is_none()
            && self.plugins_dir.is_none()
            && self.plugin_dir.is_none()
            && self.cargo_path.is_none()
    }

    pub fn values_iter(&self) -> Vec<(&'static str, String)> {
        KEYS.iter()
            .filter_map(|key| {
                self.get(key)
                    .ok()
                    .flatten()
                    .map(|value| (*key, value))
            })
            .collect()
    }

    /// Name of the plugins source directory inside the workspace
    pub fn plugins_dir_name(&self) -> &str {
        self.plugins_dir.as_deref().unwrap_or(DEFAULT_PLUGINS_DIR)
    }

    /// Where the install destinations live: `~/.cuprum`
    pub fn cuprum_home() -> Result<PathBuf, ConfigError> {
        Ok(dirs::home_dir()
            .ok_or(ConfigError::NoHomeDir)?
            .join(".cuprum"))
    }

    /// Directory the host application loads plugins from for `profile`.
    /// Debug builds of the host read `~/.cuprum/debug/plugins`, release
    /// builds read `~/.cuprum/plugins`.
    pub fn plugin_dir(&self, profile: Profile) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = &self.plugin_dir {
            return check_plugin_dir(dir);
        }
        let home = Self::cuprum_home()?;
        Ok(match profile {
            Profile::Debug => home.join("debug").join("plugins"),
            Profile::Release => home.join("plugins"),
        })
    }

    /// Resolve the cargo binary: configured path first, then PATH.
    pub fn resolve_cargo(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.cargo_path {
            let path = PathBuf::from(path);
            if path.exists() {
                return Ok(path);
            }
            logger::warn(&format!(
                "Configured cargo path no longer exists: {}; falling back to PATH",
                path.display()
            ));
        }

        which("cargo").map_err(|_| ConfigError::CargoNotFound)
    }
}

/// The install manifest sits in the plugin dir's parent, so the dir must
/// have one. Relative values would move with the current directory.
fn check_plugin_dir(value: &str) -> Result<PathBuf, ConfigError> {
    let path = PathBuf::from(value);
    let has_parent = path.parent().is_some_and(|p| !p.as_os_str().is_empty());
    if !path.is_absolute() || !has_parent {
        return Err(ConfigError::InvalidPluginDir(value.to_string()));
    }
    Ok(path)
}
