pub mod build;
pub mod clean;
pub mod discovery;
pub mod install;
pub mod list;
pub mod remove;

pub use build::run_build;
pub use clean::clean_plugins;
pub use install::{install_plugins, InstallOptions};
pub use list::list_plugins;
pub use remove::remove_plugin;
