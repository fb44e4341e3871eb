use crate::errors::CliError;
use crate::plugins::remove::delete_artifacts;
use crate::GlobalOpts;
use colored::*;
use cuprum_config::{Config, Profile};
use cuprum_logger as logger;
use cuprum_manifest::InstallManifest;

/// Delete every artifact recorded for the active profile. Files in the
/// plugin directory that this tool did not install are left alone.
pub fn clean_plugins(yes: bool, opts: &GlobalOpts) -> Result<(), CliError> {
    let config = Config::load()?;
    let profile = Profile::from_release_flag(opts.release);
    let plugin_dir = config.plugin_dir(profile)?;
    let mut manifest = InstallManifest::load(&plugin_dir)?;

    let profile_name = profile.to_string();
    let recorded: Vec<&str> = manifest
        .for_profile(&profile_name)
        .map(|(name, _)| name)
        .collect();

    if recorded.is_empty() {
        logger::warn(&format!("No {} plugins installed.", profile));
        return Ok(());
    }

    logger::debug(&format!(
        "Manifest {} has {} {} entries.",
        manifest.path().display(),
        recorded.len(),
        profile
    ));

    if !yes {
        println!("Would remove from {}:", plugin_dir.display());
        for name in &recorded {
            println!("  {}", name);
        }
        println!("To actually clean, run with --yes flag.");
        return Ok(());
    }

    let removed = manifest.remove_profile(&profile_name);
    let result = delete_artifacts(&removed);
    manifest.save()?;
    result?;

    if !opts.quiet {
        println!(
            "{}",
            format!("Removed {} plugin artifact(s)", removed.len()).dimmed()
        );
    }

    Ok(())
}
