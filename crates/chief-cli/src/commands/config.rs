//! Configuration management commands.

use anyhow::Context as _;
use chief_core::config::Config;
use chief_core::error::ConfigError;
use chief_core::paths;
use clap::Args;
use serde_json::Value;
use std::path::Path;

/// Config command arguments.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(clap::Subcommand)]
pub enum ConfigCommand {
    /// Show configuration
    Show,

    /// Get a configuration value
    Get {
        /// Configuration key (dot-separated path, e.g. `ssh.default_type`)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,

        /// Value to set (JSON, or a plain string)
        value: String,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show configuration file path
    Path,

    /// Validate configuration
    Validate,
}

/// Run the config command against `config_path` or the default file.
pub fn run(args: ConfigArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => paths::config_file()?,
    };

    match args.command {
        ConfigCommand::Show => {
            let config = Config::load_or_default(Some(&path))?;
            println!("{}", config.to_json5()?);
        }

        ConfigCommand::Get { key } => {
            let config = Config::load_or_default(Some(&path))?;
            let json = serde_json::to_value(&config)?;
            match get_path(&json, &key) {
                Some(Value::String(s)) => println!("{s}"),
                Some(v) => println!("{}", serde_json::to_string_pretty(v)?),
                None => anyhow::bail!("Key not found: {}", key),
            }
        }

        ConfigCommand::Set { key, value } => {
            let config = Config::load_or_default(Some(&path))?;
            let updated = set_path(&config, &key, &value)?;
            updated.save(&path)?;
            eprintln!("Set {} = {}", key, value);
        }

        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists: {}. Use --force to overwrite.",
                    path.display()
                );
            }
            Config::default().save(&path)?;
            eprintln!("Created config file: {}", path.display());
        }

        ConfigCommand::Path => {
            println!("{}", path.display());
        }

        ConfigCommand::Validate => match Config::load(&path) {
            Ok(config) => {
                config
                    .validate()
                    .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
                eprintln!("Configuration is valid");
            }
            Err(ConfigError::NotFound(p)) => {
                anyhow::bail!("No config file at {}; defaults are in use", p.display())
            }
            Err(e) => anyhow::bail!("Failed to load config: {}", e),
        },
    }

    Ok(())
}

/// Walk a dot-separated key path.
fn get_path<'a>(json: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.').try_fold(json, |acc, k| acc.get(k))
}

/// Return `config` with `key` set to `value`.
///
/// `value` is parsed as JSON first (numbers, booleans), falling back to a
/// plain string. The result must still deserialize as a [`Config`].
fn set_path(config: &Config, key: &str, value: &str) -> anyhow::Result<Config> {
    let mut json = serde_json::to_value(config)?;
    let parsed: Value =
        serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));

    let parts: Vec<&str> = key.split('.').collect();
    let (leaf, parents) = parts
        .split_last()
        .filter(|(leaf, _)| !leaf.is_empty())
        .ok_or_else(|| anyhow::anyhow!("Invalid key: '{}'", key))?;

    let mut current = &mut json;
    for part in parents {
        if !current.get(*part).is_some_and(Value::is_object) {
            current[*part] = serde_json::json!({});
        }
        current = &mut current[*part];
    }
    current[*leaf] = parsed;

    serde_json::from_value(json).with_context(|| format!("Invalid value for {key}"))
}
