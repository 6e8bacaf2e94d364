use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;

use elpicker::PickerConfig;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the configuration file location
    Path,
}

fn target_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path),
        None => PickerConfig::default_path(),
    }
}

pub fn handle_config(command: ConfigCommands, config_path: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let config = PickerConfig::resolve(config_path.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommands::Init { force } => {
            let path = target_path(config_path)?;
            if path.exists() && !force {
                anyhow::bail!(
                    "Config '{}' already exists (use --force to overwrite)",
                    path.display()
                );
            }
            PickerConfig::default().save(&path)?;
            println!("{}", path.display());
        }
        ConfigCommands::Path => {
            println!("{}", target_path(config_path)?.display());
        }
    }
    Ok(())
}
