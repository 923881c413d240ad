//! Secret vault commands.

use crate::{render, Context};
use chief_plugins::vault::{EditOutcome, Vault};
use clap::Args;
use std::path::PathBuf;

/// Vault command arguments.
#[derive(Args)]
pub struct VaultArgs {
    #[command(subcommand)]
    pub command: VaultCommand,
}

#[derive(clap::Subcommand)]
pub enum VaultCommand {
    /// Edit a vault file, creating and encrypting it when missing
    Edit {
        /// Vault file (defaults to the loaded vault, then ~/.chief_secrets.sh)
        path: Option<String>,

        /// Load the vault into the shell afterwards
        #[arg(short, long)]
        load: bool,
    },

    /// Decrypt a vault file into the calling shell
    Load {
        /// Vault file
        path: Option<String>,
    },
}

/// Run the vault command.
pub async fn run(args: VaultArgs, ctx: &mut Context) -> anyhow::Result<()> {
    let vault = Vault::from_config(&ctx.session, &ctx.config.vault);

    match args.command {
        VaultCommand::Edit { path, load: false } => {
            edit(&vault, ctx, path.as_deref()).await?;
        }

        VaultCommand::Edit { path, load: true } => {
            ctx.ensure_eval_target("decrypted secrets")?;
            let file = edit(&vault, ctx, path.as_deref()).await?;
            let file = file.to_string_lossy().into_owned();
            load(&vault, ctx, Some(file.as_str())).await?;
        }

        VaultCommand::Load { path } => {
            ctx.ensure_eval_target("decrypted secrets")?;
            load(&vault, ctx, path.as_deref()).await?;
        }
    }

    Ok(())
}

async fn edit(vault: &Vault, ctx: &Context, path: Option<&str>) -> anyhow::Result<PathBuf> {
    let (file, outcome) = vault.edit(&ctx.session, &ctx.runner, path).await?;
    match outcome {
        EditOutcome::Created => render::success(format!("Created encrypted vault {}", file.display())),
        EditOutcome::Edited => render::success(format!("Saved {}", file.display())),
    }
    Ok(file)
}

async fn load(vault: &Vault, ctx: &mut Context, path: Option<&str>) -> anyhow::Result<()> {
    let script = vault.load(&mut ctx.session, &ctx.runner, path).await?;
    ctx.emit_shell(&script)?;
    if let Some(file) = ctx.session.secrets_file() {
        render::success(format!("Loaded secrets from {}", file.display()));
    }
    Ok(())
}
