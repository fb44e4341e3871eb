//! Enumerating the plugins source directory

use crate::errors::WorkspaceError;
use cuprum_logger as logger;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// One plugin crate under the plugins directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginSource {
    /// Directory name, used as the plugin's name on the command line
    pub name: String,
    pub path: PathBuf,
    /// Executables this plugin produces
    pub bins: Vec<String>,
}

/// The parts of a plugin's Cargo.toml that decide its binary names
#[derive(Deserialize, Debug, Default)]
struct CargoManifest {
    package: Option<PackageSection>,
    #[serde(default)]
    bin: Vec<BinTarget>,
}

#[derive(Deserialize, Debug)]
struct PackageSection {
    name: String,
}

#[derive(Deserialize, Debug)]
struct BinTarget {
    name: Option<String>,
}

/// List plugins in `plugins_dir`, one per subdirectory, sorted by name.
/// Plain files and hidden entries are skipped.
pub fn discover_plugins(plugins_dir: &Path) -> Result<Vec<PluginSource>, WorkspaceError> {
    if !plugins_dir.is_dir() {
        return Err(WorkspaceError::PluginsDirMissing(plugins_dir.to_path_buf()));
    }

    let read_err = |source| WorkspaceError::ReadPluginsDir {
        path: plugins_dir.to_path_buf(),
        source,
    };

    let mut plugins = Vec::new();
    for entry in fs::read_dir(plugins_dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();

        if name.starts_with('.') {
            continue;
        }
        if !path.is_dir() {
            logger::debug(&format!("Skipping non-directory entry {}", path.display()));
            continue;
        }

        let bins = binary_names(&path, &name);
        plugins.push(PluginSource { name, path, bins });
    }

    plugins.sort_by(|a, b| a.name.cmp(&b.name));
    logger::debug(&format!(
        "Found {} plugin(s) in {}",
        plugins.len(),
        plugins_dir.display()
    ));
    Ok(plugins)
}

/// Binary names declared by the plugin's Cargo.toml: every `[[bin]]` name,
/// else the package name, else the directory name.
fn binary_names(plugin_path: &Path, dir_name: &str) -> Vec<String> {
    let manifest_path = plugin_path.join("Cargo.toml");
    let manifest = match fs::read_to_string(&manifest_path) {
        Ok(content) => match toml::from_str::<CargoManifest>(&content) {
            Ok(manifest) => manifest,
            Err(e) => {
                logger::warn(&format!(
                    "Could not parse {}: {}; using directory name",
                    manifest_path.display(),
                    e
                ));
                CargoManifest::default()
            }
        },
        Err(_) => {
            logger::debug(&format!(
                "No Cargo.toml in {}; using directory name",
                plugin_path.display()
            ));
            CargoManifest::default()
        }
    };

    let bins: Vec<String> = manifest.bin.into_iter().filter_map(|b| b.name).collect();
    if !bins.is_empty() {
        return bins;
    }

    match manifest.package {
        Some(package) => vec![package.name],
        None => vec![dir_name.to_string()],
    }
}

/// Keep only the plugins named in `names` (all plugins when empty).
/// Returns the first unknown name as an error.
pub fn select_plugins(
    plugins: Vec<PluginSource>,
    names: &[String],
) -> Result<Vec<PluginSource>, String> {
    if names.is_empty() {
        return Ok(plugins);
    }

    if let Some(unknown) = names
        .iter()
        .find(|n| !plugins.iter().any(|p| &p.name == *n || p.bins.contains(*n)))
    {
        return Err(unknown.clone());
    }

    Ok(plugins
        .into_iter()
        .filter(|p| names.iter().any(|n| n == &p.name || p.bins.contains(n)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn add_plugin(root: &Path, dir: &str, cargo_toml: Option<&str>) {
        let path = root.join(dir);
        fs::create_dir_all(&path).unwrap();
        if let Some(content) = cargo_toml {
            fs::write(path.join("Cargo.toml"), content).unwrap();
        }
    }

    #[test]
    fn test_discover_sorted_directories_only() {
        let dir = TempDir::new().unwrap();
        add_plugin(dir.path(), "zeta", None);
        add_plugin(dir.path(), "alpha", None);
        add_plugin(dir.path(), ".hidden", None);
        fs::write(dir.path().join("README.md"), "notes").unwrap();

        let plugins = discover_plugins(dir.path()).unwrap();
        let names: Vec<&str> = plugins.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_each_plugin_is_its_own_entry() {
        let dir = TempDir::new().unwrap();
        add_plugin(dir.path(), "one", None);
        add_plugin(dir.path(), "two", None);

        let plugins = discover_plugins(dir.path()).unwrap();
        assert_eq!(plugins.len(), 2);
        assert_eq!(plugins[0].bins, vec!["one"]);
        assert_eq!(plugins[1].bins, vec!["two"]);
    }

    #[test]
    fn test_package_name_overrides_dir_name() {
        let dir = TempDir::new().unwrap();
        add_plugin(
            dir.path(),
            "example",
            Some("[package]\nname = \"example-plugin\"\nversion = \"0.1.0\"\n"),
        );
        let plugins = discover_plugins(dir.path()).unwrap();
        assert_eq!(plugins[0].name, "example");
        assert_eq!(plugins[0].bins, vec!["example-plugin"]);
    }

    #[test]
    fn test_bin_targets_take_precedence() {
        let dir = TempDir::new().unwrap();
        add_plugin(
            dir.path(),
            "multi",
            Some(
                "[package]\nname = \"multi\"\n\n[[bin]]\nname = \"multi-a\"\npath = \"src/a.rs\"\n\n[[bin]]\nname = \"multi-b\"\npath = \"src/b.rs\"\n",
            ),
        );
        let plugins = discover_plugins(dir.path()).unwrap();
        assert_eq!(plugins[0].bins, vec!["multi-a", "multi-b"]);
    }

    #[test]
    fn test_unparseable_manifest_falls_back_to_dir_name() {
        let dir = TempDir::new().unwrap();
        add_plugin(dir.path(), "broken", Some("[package\nname ="));
        let plugins = discover_plugins(dir.path()).unwrap();
        assert_eq!(plugins[0].bins, vec!["broken"]);
    }

    #[test]
    fn test_missing_plugins_dir() {
        let dir = TempDir::new().unwrap();
        let err = discover_plugins(&dir.path().join("plugins")).unwrap_err();
        assert!(matches!(err, WorkspaceError::PluginsDirMissing(_)));
    }

    #[test]
    fn test_select_plugins() {
        let plugins = vec![
            PluginSource {
                name: "a".to_string(),
                path: PathBuf::from("plugins/a"),
                bins: vec!["a-bin".to_string()],
            },
            PluginSource {
                name: "b".to_string(),
                path: PathBuf::from("plugins/b"),
                bins: vec!["b".to_string()],
            },
        ];

        let all = select_plugins(plugins.clone(), &[]).unwrap();
        assert_eq!(all.len(), 2);

        let by_bin = select_plugins(plugins.clone(), &["a-bin".to_string()]).unwrap();
        assert_eq!(by_bin[0].name, "a");

        let unknown = select_plugins(plugins, &["c".to_string()]).unwrap_err();
        assert_eq!(unknown, "c");
    }
}
