//! Record of the plugin binaries copied into a plugin directory.
//!
//! **This file is auto-managed by cuprum-plugins. Do not edit it by hand.**
//!
//! The host application spawns every entry of the plugin directory as a
//! plugin process, so the manifest is kept *beside* that directory
//! (`<plugin-dir>/../installed-plugins.toml`), never inside it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const MANIFEST_FILE_NAME: &str = "installed-plugins.toml";

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse manifest: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize manifest: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid manifest entry '{0}': {1}")]
    InvalidEntry(String, String),

    #[error("Plugin directory {0} has no parent to hold the install manifest")]
    NoParentDir(PathBuf),
}

/// One artifact copied into the plugin directory
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InstalledArtifact {
    /// Plugin (source directory name) that produced this artifact
    pub plugin: String,

    /// Build profile the artifact came from ("debug" or "release")
    pub profile: String,

    /// Path of the build output that was copied
    pub source: PathBuf,

    /// Path inside the plugin directory
    pub destination: PathBuf,

    /// Size in bytes at install time
    pub size: u64,

    pub installed_at: DateTime<Utc>,
}

impl InstalledArtifact {
    fn validate(&self, name: &str) -> Result<(), ManifestError> {
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(ManifestError::InvalidEntry(
                name.to_string(),
                "artifact name must be a single file name".to_string(),
            ));
        }
        if self.plugin.is_empty() {
            return Err(ManifestError::InvalidEntry(
                name.to_string(),
                "missing plugin name".to_string(),
            ));
        }
        Ok(())
    }
}

/// Installed artifacts keyed by artifact file name
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct InstallManifest {
    #[serde(default)]
    pub artifacts: BTreeMap<String, InstalledArtifact>,

    #[serde(skip)]
    path: PathBuf,
}

impl InstallManifest {
    /// Manifest location for a given plugin directory. A directory without
    /// a parent (`/`, or a bare relative name) has nowhere to put it.
    pub fn path_for(plugin_dir: &Path) -> Result<PathBuf, ManifestError> {
        match plugin_dir.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => Ok(parent.join(MANIFEST_FILE_NAME)),
            _ => Err(ManifestError::NoParentDir(plugin_dir.to_path_buf())),
        }
    }

    /// Load the manifest for `plugin_dir`, returning an empty one if it does
    /// not exist yet.
    pub fn load(plugin_dir: &Path) -> Result<Self, ManifestError> {
        let path = Self::path_for(plugin_dir)?;
        if !path.exists() {
            debug!("no install manifest at {}", path.display());
            return Ok(InstallManifest {
                path,
                ..Default::default()
            });
        }

        let content = std::fs::read_to_string(&path)?;
        let mut manifest: InstallManifest = toml::from_str(&content)?;
        for (name, artifact) in &manifest.artifacts {
            artifact.validate(name)?;
        }
        manifest.path = path;
        Ok(manifest)
    }

    pub fn save(&self) -> Result<(), ManifestError> {
        for (name, artifact) in &self.artifacts {
            artifact.validate(name)?;
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.path, content)?;
        debug!(
            "saved install manifest with {} entries to {}",
            self.artifacts.len(),
            self.path.display()
        );
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add or replace the record for `name`
    pub fn record(&mut self, name: String, artifact: InstalledArtifact) -> Result<(), ManifestError> {
        artifact.validate(&name)?;
        self.artifacts.insert(name, artifact);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&InstalledArtifact> {
        self.artifacts.get(name)
    }

    /// Remove every record whose artifact or plugin name is `name`.
    /// Returns the removed records.
    pub fn remove_matching(&mut self, name: &str) -> Vec<(String, InstalledArtifact)> {
        let keys: Vec<String> = self
            .artifacts
            .iter()
            .filter(|(key, artifact)| key.as_str() == name || artifact.plugin == name)
            .map(|(key, _)| key.clone())
            .collect();

        keys.into_iter()
            .filter_map(|key| self.artifacts.remove(&key).map(|a| (key, a)))
            .collect()
    }

    /// Remove every record for `profile`. Returns the removed records.
    pub fn remove_profile(&mut self, profile: &str) -> Vec<(String, InstalledArtifact)> {
        let keys: Vec<String> = self
            .for_profile(profile)
            .map(|(key, _)| key.to_string())
            .collect();

        keys.into_iter()
            .filter_map(|key| self.artifacts.remove(&key).map(|a| (key, a)))
            .collect()
    }

    pub fn for_profile<'a>(
        &'a self,
        profile: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a InstalledArtifact)> + 'a {
        self.artifacts
            .iter()
            .filter(move |(_, artifact)| artifact.profile == profile)
            .map(|(key, artifact)| (key.as_str(), artifact))
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn artifact(plugin: &str, profile: &str) -> InstalledArtifact {
        InstalledArtifact {
            plugin: plugin.to_string(),
            profile: profile.to_string(),
            source: PathBuf::from(format!("target/{}/{}", profile, plugin)),
            destination: PathBuf::from(format!("/plugins/{}", plugin)),
            size: 42,
            installed_at: Utc::now(),
        }
    }

    #[test]
    fn test_manifest_lives_beside_plugin_dir() {
        let path = InstallManifest::path_for(Path::new("/home/u/.cuprum/debug/plugins")).unwrap();
        assert_eq!(
            path,
            PathBuf::from("/home/u/.cuprum/debug/installed-plugins.toml")
        );
    }

    #[test]
    fn test_plugin_dir_without_parent_is_rejected() {
        for dir in ["/", "plugins", ""] {
            let err = InstallManifest::path_for(Path::new(dir)).unwrap_err();
            assert!(matches!(err, ManifestError::NoParentDir(_)), "{:?}", dir);
            assert!(InstallManifest::load(Path::new(dir)).is_err());
        }
    }

    #[test]
    fn test_record_and_get() {
        let mut manifest = InstallManifest::default();
        assert!(manifest.is_empty());
        manifest
            .record("example-plugin".to_string(), artifact("example-plugin", "debug"))
            .unwrap();
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.get("example-plugin").unwrap().size, 42);
    }

    #[test]
    fn test_record_rejects_path_names() {
        let mut manifest = InstallManifest::default();
        let err = manifest
            .record("../escape".to_string(), artifact("escape", "debug"))
            .unwrap_err();
        assert!(matches!(err, ManifestError::InvalidEntry(..)));
    }

    #[test]
    fn test_remove_matching_by_plugin_name() {
        let mut manifest = InstallManifest::default();
        manifest
            .record("tool-a".to_string(), artifact("multi", "debug"))
            .unwrap();
        manifest
            .record("tool-b".to_string(), artifact("multi", "debug"))
            .unwrap();
        manifest
            .record("other".to_string(), artifact("other", "debug"))
            .unwrap();

        let removed = manifest.remove_matching("multi");
        assert_eq!(removed.len(), 2);
        assert!(manifest.get("other").is_some());
        assert!(manifest.remove_matching("missing").is_empty());
    }

    #[test]
    fn test_remove_profile_keeps_other_profile() {
        let mut manifest = InstallManifest::default();
        manifest
            .record("a".to_string(), artifact("a", "debug"))
            .unwrap();
        manifest
            .record("b".to_string(), artifact("b", "release"))
            .unwrap();

        let removed = manifest.remove_profile("debug");
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].0, "a");
        assert!(manifest.get("b").is_some());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let plugin_dir = dir.path().join("debug").join("plugins");

        let mut manifest = InstallManifest::load(&plugin_dir).unwrap();
        assert!(manifest.is_empty());
        manifest
            .record("example-plugin".to_string(), artifact("example-plugin", "debug"))
            .unwrap();
        manifest.save().unwrap();

        // the plugin directory itself is left untouched
        assert!(!plugin_dir.exists());
        assert!(dir.path().join("debug").join(MANIFEST_FILE_NAME).exists());

        let loaded = InstallManifest::load(&plugin_dir).unwrap();
        assert_eq!(loaded.artifacts, manifest.artifacts);
    }
}
