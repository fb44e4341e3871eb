use crate::errors::{CliError, InstallError};
use crate::plugins::build::build_workspace;
use crate::plugins::discovery::{discover_plugins, select_plugins, PluginSource};
use crate::workspace::{artifact_file_name, Workspace};
use crate::GlobalOpts;
use chrono::Utc;
use colored::*;
use cuprum_config::Config;
use cuprum_logger as logger;
use cuprum_manifest::{InstallManifest, InstalledArtifact};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Options for `cuprum-plugins install`
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    pub names: Vec<String>,
    pub no_build: bool,
    pub cargo_args: Vec<String>,
}

/// One artifact copied during this run
#[derive(Debug, Clone, PartialEq)]
pub struct InstalledCopy {
    pub plugin: String,
    pub artifact: String,
    pub destination: PathBuf,
}

#[derive(Debug, Default)]
pub struct InstallReport {
    pub installed: Vec<InstalledCopy>,
    /// Expected build outputs that did not exist
    pub missing: Vec<PathBuf>,
}

/// Build the workspace, then copy every plugin's binaries into the plugin
/// directory. Nothing is copied when the build fails.
pub fn install_plugins(opts: &GlobalOpts, install: &InstallOptions) -> Result<(), CliError> {
    let config = Config::load()?;
    let workspace = Workspace::resolve(opts, &config)?;

    let plugins = discover_plugins(&workspace.plugins_dir)?;
    let plugins =
        select_plugins(plugins, &install.names).map_err(InstallError::UnknownPlugin)?;

    if install.no_build {
        logger::info("Skipping build (--no-build)");
    } else {
        let cargo = config.resolve_cargo()?;
        build_workspace(&cargo, &workspace, &install.cargo_args)?;
    }

    if plugins.is_empty() {
        logger::warn(&format!(
            "No plugins found in {}",
            workspace.plugins_dir.display()
        ));
        return Ok(());
    }

    let plugin_dir = config.plugin_dir(workspace.profile)?;
    logger::step(&format!(
        "Installing {} plugin(s) into {}",
        plugins.len(),
        plugin_dir.display()
    ));

    let mut manifest = InstallManifest::load(&plugin_dir)?;
    let result = copy_artifacts(&workspace, &plugins, &plugin_dir, &mut manifest);
    // keep the records of whatever was copied, even if a later copy failed
    let saved = manifest.save();
    let report = result?;
    saved?;

    if !opts.quiet && !report.installed.is_empty() {
        println!(
            "{}",
            format!(
                "Installed {} plugin(s) into {}",
                report.installed.len(),
                plugin_dir.display()
            )
            .dimmed()
        );
        for copy in &report.installed {
            if copy.artifact == copy.plugin {
                println!(" {} {}", "+".bold().green(), copy.artifact.bold());
            } else {
                println!(
                    " {} {} {}",
                    "+".bold().green(),
                    copy.artifact.bold(),
                    format!("({})", copy.plugin).dimmed()
                );
            }
        }
    }

    if !report.missing.is_empty() {
        return Err(InstallError::MissingArtifacts(report.missing).into());
    }

    Ok(())
}

/// Copy each plugin's artifacts from the build output into `plugin_dir`,
/// one at a time in the order given. Missing artifacts are reported and
/// skipped; any other IO failure stops the run.
pub fn copy_artifacts(
    workspace: &Workspace,
    plugins: &[PluginSource],
    plugin_dir: &Path,
    manifest: &mut InstallManifest,
) -> Result<InstallReport, CliError> {
    fs::create_dir_all(plugin_dir).map_err(|source| InstallError::CreatePluginDir {
        path: plugin_dir.to_path_buf(),
        source,
    })?;

    // staged copies must not appear in the plugin dir, where the host would
    // try to spawn them; rename needs the parent on the same filesystem
    let staging_dir = plugin_dir.parent().unwrap_or(plugin_dir);

    let mut report = InstallReport::default();
    for plugin in plugins {
        for bin in &plugin.bins {
            let source = workspace.artifact_path(bin);
            if !source.is_file() {
                logger::error(&format!(
                    "Built artifact for plugin '{}' not found: {}",
                    plugin.name,
                    source.display()
                ));
                report.missing.push(source);
                continue;
            }

            let file_name = artifact_file_name(bin);
            let destination = plugin_dir.join(&file_name);
            let size = replace_file(&source, &destination, staging_dir).map_err(|e| {
                InstallError::Copy {
                    from: source.clone(),
                    to: destination.clone(),
                    source: e,
                }
            })?;
            logger::info(&format!(
                "Copied {} -> {} ({} bytes)",
                source.display(),
                destination.display(),
                size
            ));

            manifest.record(
                file_name.clone(),
                InstalledArtifact {
                    plugin: plugin.name.clone(),
                    profile: workspace.profile.to_string(),
                    source,
                    destination: destination.clone(),
                    size,
                    installed_at: Utc::now(),
                },
            )?;

            report.installed.push(InstalledCopy {
                plugin: plugin.name.clone(),
                artifact: file_name,
                destination,
            });
        }
    }

    Ok(report)
}

/// Copy `source` next to `destination` and rename it over the old file.
/// A running plugin keeps its old inode, so replacing it never fails with
/// "text file busy", and the host never sees a half-written binary.
fn replace_file(source: &Path, destination: &Path, staging_dir: &Path) -> io::Result<u64> {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let staged = staging_dir.join(format!(".{}.partial", name));

    let size = fs::copy(source, &staged)?;
    if let Err(e) = fs::rename(&staged, destination) {
        let _ = fs::remove_file(&staged);
        return Err(e);
    }
    Ok(size)
}
