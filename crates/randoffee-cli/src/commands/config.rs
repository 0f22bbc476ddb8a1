use std::path::Path;

use clap::Subcommand;
use randoffee_core::{Config, ConfigError};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "generator.group_size", "paths.previous")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction, dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => match Config::load(dir)?.get(&key) {
            Some(value) => println!("{value}"),
            None => return Err(ConfigError::UnknownKey(key).into()),
        },
        ConfigAction::Set { key, value } => {
            let mut config = Config::load(dir)?;
            config.set(&key, &value)?;
            config.generator_config().validate()?;
            config.save(dir)?;
            println!("ok");
        }
        ConfigAction::List => {
            let config = Config::load(dir)?;
            println!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Reset => {
            Config::default().save(dir)?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
