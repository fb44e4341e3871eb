use crate::errors::{CliError, InstallError};
use crate::GlobalOpts;
use colored::*;
use cuprum_config::{Config, Profile};
use cuprum_logger as logger;
use cuprum_manifest::{InstallManifest, InstalledArtifact};
use std::fs;
use std::io;
use std::path::Path;

pub fn remove_plugin(name: &str, opts: &GlobalOpts) -> Result<(), CliError> {
    let config = Config::load()?;
    let plugin_dir = config.plugin_dir(Profile::from_release_flag(opts.release))?;
    let mut manifest = InstallManifest::load(&plugin_dir)?;

    let removed = manifest.remove_matching(name);
    if removed.is_empty() {
        logger::warn(&format!(
            "Plugin '{}' is not installed in {}",
            name,
            plugin_dir.display()
        ));
        return Ok(());
    }

    let result = delete_artifacts(&removed);
    // records go either way: a failed delete leaves a file the user must
    // handle, but the entry no longer describes a working install
    manifest.save()?;
    result?;

    if !opts.quiet {
        println!(
            "{}",
            format!("Removed {} artifact(s)", removed.len()).dimmed()
        );
        for (artifact, _) in &removed {
            println!(" {} {}", "-".bold().red(), artifact.bold());
        }
    }

    Ok(())
}

/// Delete the installed files of `records`. Files already gone are fine.
pub(crate) fn delete_artifacts(records: &[(String, InstalledArtifact)]) -> Result<(), InstallError> {
    for (name, artifact) in records {
        remove_file_if_exists(&artifact.destination)?;
        logger::debug(&format!(
            "Removed {} ({})",
            name,
            artifact.destination.display()
        ));
    }
    Ok(())
}

fn remove_file_if_exists(path: &Path) -> Result<(), InstallError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            logger::debug(&format!("{} was already removed", path.display()));
            Ok(())
        }
        Err(source) => Err(InstallError::Remove {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn record(dir: &Path, name: &str) -> (String, InstalledArtifact) {
        (
            name.to_string(),
            InstalledArtifact {
                plugin: name.to_string(),
                profile: "debug".to_string(),
                source: PathBuf::from("target/debug").join(name),
                destination: dir.join(name),
                size: 1,
                installed_at: Utc::now(),
            },
        )
    }

    #[test]
    fn test_delete_artifacts_removes_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("alpha"), "x").unwrap();
        delete_artifacts(&[record(dir.path(), "alpha")]).unwrap();
        assert!(!dir.path().join("alpha").exists());
    }

    #[test]
    fn test_delete_artifacts_tolerates_missing_files() {
        let dir = TempDir::new().unwrap();
        assert!(delete_artifacts(&[record(dir.path(), "gone")]).is_ok());
    }
}
