//! chief command-line interface.

pub mod commands;
pub mod context;
pub mod render;

use chief_core::config::LogLevel;
use chief_plugins::PluginError;
use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

pub use context::Context;

/// chief - shell helpers for SSH keys, Python venvs and secret vaults
#[derive(Parser)]
#[command(name = "chief")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file
    #[arg(short, long, env = "CHIEF_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Append shell code to this file instead of printing it
    #[arg(long, env = "CHIEF_EVAL_FILE", hide = true, global = true)]
    pub eval_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Manage Python virtual environments
    Venv(commands::venv::VenvArgs),

    /// Manage SSH keys
    Ssh(commands::ssh::SshArgs),

    /// Edit and load ansible-vault secret files
    Vault(commands::vault::VaultArgs),

    /// Switch AWS credential roles
    Aws(commands::aws::AwsArgs),

    /// Configuration management
    Config(commands::config::ConfigArgs),

    /// Check external tools and configuration
    Doctor(commands::doctor::DoctorArgs),

    /// Print the shell function that applies venv and vault changes
    ShellInit(commands::shell::ShellInitArgs),

    /// Show version information
    Version,
}

/// Run the CLI with the given arguments.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Config(args) => commands::config::run(args, cli.config.as_deref()),
        Commands::ShellInit(args) => {
            print!("{}", commands::shell::wrapper(args.shell));
            Ok(())
        }
        Commands::Version => {
            println!("chief {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        command => {
            let mut ctx = Context::from_process(cli.config.as_deref(), cli.eval_file)?;
            match command {
                Commands::Venv(args) => commands::venv::run(args, &mut ctx).await,
                Commands::Ssh(args) => commands::ssh::run(args, &ctx).await,
                Commands::Vault(args) => commands::vault::run(args, &mut ctx).await,
                Commands::Aws(args) => commands::aws::run(args, &ctx),
                Commands::Doctor(args) => commands::doctor::run(args, &ctx),
                Commands::Config(_) | Commands::ShellInit(_) | Commands::Version => Ok(()),
            }
        }
    }
}

/// Accept `-?` wherever `--help` is accepted.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| if arg == "-?" { OsString::from("--help") } else { arg })
        .collect()
}

/// Process exit status for a failed command.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<PluginError>()
        .map(PluginError::exit_code)
        .unwrap_or(1)
}

/// Default `tracing` filter for a `-v` count and configured level.
pub fn log_directive(verbose: u8, configured: LogLevel) -> String {
    let level = match verbose {
        0 => configured.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    format!("chief={level}")
}
