//! chief CLI entry point.

use chief_cli::{exit_code, log_directive, normalize_args, render, run, Cli};
use chief_core::env::vars;
use chief_core::Config;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));

    // Initialize logging on stderr; stdout may carry shell code
    let configured = Config::load_or_default(cli.config.as_deref())
        .map(|c| c.logging.level)
        .unwrap_or_default();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(vars::CHIEF_LOG)
                .unwrap_or_else(|_| log_directive(cli.verbose, configured).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Run the command
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            render::error(&err);
            ExitCode::from(exit_code(&err))
        }
    }
}
