use crate::cli::ConfigAction;
use crate::errors::CliError;
use colored::*;
use cuprum_config::{Config, KEYS};
use cuprum_logger as logger;

pub fn handle_config(action: &ConfigAction) -> Result<(), CliError> {
    match action {
        ConfigAction::Show => {
            let config = Config::load()?;
            if config.is_empty() {
                println!("{}", "No configuration set; using defaults.".dimmed());
                println!("Available keys: {}", KEYS.join(", "));
                return Ok(());
            }
            for (key, value) in config.values_iter() {
                println!("{} = {}", key.cyan(), value);
            }
        }
        ConfigAction::Path => {
            println!("{}", Config::path()?.display());
        }
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(key)? {
                Some(value) => println!("{}", value),
                None => logger::warn(&format!("'{}' is not set", key)),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(key, value.clone())?;
            config.save()?;
            logger::success(&format!("Set {} = {}", key, value));
        }
        ConfigAction::Reset => {
            Config::reset()?;
            logger::success("Configuration reset to defaults");
        }
    }
    Ok(())
}
