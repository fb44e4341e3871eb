use crate::errors::CliError;
use crate::plugins::discovery::{discover_plugins, PluginSource};
use crate::workspace::{artifact_file_name, Workspace};
use crate::GlobalOpts;
use chrono::{DateTime, Utc};
use colored::*;
use cuprum_config::Config;
use cuprum_manifest::InstallManifest;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ArtifactStatus {
    pub name: String,
    pub source: PathBuf,
    pub built: bool,
    pub destination: PathBuf,
    pub installed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installed_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PluginStatus {
    pub name: String,
    pub path: PathBuf,
    pub artifacts: Vec<ArtifactStatus>,
}

pub fn plugin_status(
    workspace: &Workspace,
    plugin: &PluginSource,
    plugin_dir: &Path,
    manifest: &InstallManifest,
) -> PluginStatus {
    let artifacts = plugin
        .bins
        .iter()
        .map(|bin| {
            let file_name = artifact_file_name(bin);
            let source = workspace.artifact_path(bin);
            let destination = plugin_dir.join(&file_name);
            ArtifactStatus {
                built: source.is_file(),
                installed: destination.is_file(),
                installed_at: manifest.get(&file_name).map(|a| a.installed_at),
                name: file_name,
                source,
                destination,
            }
        })
        .collect();

    PluginStatus {
        name: plugin.name.clone(),
        path: plugin.path.clone(),
        artifacts,
    }
}

pub fn list_plugins(json: bool, opts: &GlobalOpts) -> Result<(), CliError> {
    let config = Config::load()?;
    let workspace = Workspace::resolve(opts, &config)?;
    let plugin_dir = config.plugin_dir(workspace.profile)?;
    let manifest = InstallManifest::load(&plugin_dir)?;

    let statuses: Vec<PluginStatus> = discover_plugins(&workspace.plugins_dir)?
        .iter()
        .map(|plugin| plugin_status(&workspace, plugin, &plugin_dir, &manifest))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }

    if statuses.is_empty() {
        println!("{}", "No plugins found.".yellow());
        println!("Plugins are read from: {}", workspace.plugins_dir.display());
        return Ok(());
    }

    println!(
        "{}",
        format!(
            "Plugins ({} profile, installing to {}):",
            workspace.profile,
            plugin_dir.display()
        )
        .bold()
    );
    for status in &statuses {
        for artifact in &status.artifacts {
            let built = if artifact.built {
                "built".green()
            } else {
                "not built".red()
            };
            let installed = match (artifact.installed, artifact.installed_at) {
                (true, Some(at)) => format!("installed {}", at.format("%Y-%m-%d %H:%M")).green(),
                (true, None) => "installed".green(),
                (false, _) => "not installed".yellow(),
            };
            let label = if artifact.name == status.name {
                artifact.name.cyan().to_string()
            } else {
                format!(
                    "{} {}",
                    artifact.name.cyan(),
                    format!("({})", status.name).dimmed()
                )
            };
            println!("  {:<32} {:<12} {}", label, built, installed);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cuprum_config::Profile;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_plugin_status_reports_built_and_installed() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        let workspace = Workspace {
            plugins_dir: root.join("plugins"),
            target_dir: root.join("target"),
            root: root.clone(),
            profile: Profile::Debug,
        };
        let plugin_dir = root.join("installed").join("plugins");
        fs::create_dir_all(workspace.output_dir()).unwrap();
        fs::create_dir_all(&plugin_dir).unwrap();

        fs::write(workspace.artifact_path("a"), "a").unwrap();
        fs::write(workspace.artifact_path("b"), "b").unwrap();
        fs::write(plugin_dir.join(artifact_file_name("b")), "b").unwrap();

        let plugin = PluginSource {
            name: "multi".to_string(),
            path: root.join("plugins").join("multi"),
            bins: vec!["a".to_string(), "b".to_string(), "c".to_string()],
        };
        let status = plugin_status(
            &workspace,
            &plugin,
            &plugin_dir,
            &InstallManifest::default(),
        );

        let flags: Vec<(bool, bool)> = status
            .artifacts
            .iter()
            .map(|a| (a.built, a.installed))
            .collect();
        assert_eq!(flags, vec![(true, false), (true, true), (false, false)]);
        assert!(status.artifacts[1].installed_at.is_none());
    }

    #[test]
    fn test_plugin_status_serializes() {
        let status = PluginStatus {
            name: "p".to_string(),
            path: PathBuf::from("plugins/p"),
            artifacts: vec![ArtifactStatus {
                name: "p".to_string(),
                source: PathBuf::from("target/debug/p"),
                built: true,
                destination: PathBuf::from("/plugins/p"),
                installed: false,
                installed_at: None,
            }],
        };
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["artifacts"][0]["built"], true);
        assert!(value["artifacts"][0].get("installed_at").is_none());
    }
}
