//! SSH key commands.

use crate::{render, Context};
use chief_core::config::KeyType;
use chief_plugins::ssh::{self, SshDir};
use clap::Args;

/// SSH command arguments.
#[derive(Args)]
pub struct SshArgs {
    #[command(subcommand)]
    pub command: SshCommand,
}

#[derive(clap::Subcommand)]
pub enum SshCommand {
    /// Create a key pair (`id_<type>`, or `<name>.key` with a name)
    Create {
        /// Key name
        name: Option<String>,

        /// Key type: ed25519 or rsa
        #[arg(short = 't', long = "type")]
        key_type: Option<KeyType>,

        /// Key comment, usually an email address
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Print the public key of a private key file
    Pubkey {
        /// Private key file
        private_key: String,
    },

    /// Remove one line from known_hosts
    RmHost {
        /// 1-based line number, as reported by ssh
        line: String,
    },

    /// List key pairs in the key directory
    List,

    /// Add every `*.key` private key to the ssh agent
    Load,
}

/// Run the ssh command.
pub async fn run(args: SshArgs, ctx: &Context) -> anyhow::Result<()> {
    let dir = SshDir::from_config(&ctx.session, &ctx.config.ssh);

    match args.command {
        SshCommand::Create {
            name,
            key_type,
            email,
        } => {
            let key = dir
                .create_key_pair(
                    &ctx.session,
                    &ctx.runner,
                    &ctx.prompter,
                    name.as_deref(),
                    key_type.unwrap_or(ctx.config.ssh.default_type),
                    email.as_deref(),
                )
                .await?;
            render::success(format!(
                "Created {} key {}",
                key.algorithm,
                key.private_path.display()
            ));
            render::hint(format!("Public key: {}", key.public_path.display()));
        }

        SshCommand::Pubkey { private_key } => {
            let key = ssh::extract_public_key(&ctx.session, &ctx.runner, &private_key).await?;
            println!("{key}");
        }

        SshCommand::RmHost { line } => {
            let removed = dir.remove_known_host_line(&line)?;
            render::success(format!(
                "Removed line {} from {}",
                line.trim(),
                dir.known_hosts().display()
            ));
            render::hint(removed);
        }

        SshCommand::List => {
            render::key_list(&dir.list_keys()?);
        }

        SshCommand::Load => {
            let loaded = dir.load_keys(&ctx.runner).await?;
            if loaded.is_empty() {
                render::hint(format!("No *.key files in {}", dir.path().display()));
            } else {
                render::success(format!("Loaded {} key(s) into the agent", loaded.len()));
            }
        }
    }

    Ok(())
}
