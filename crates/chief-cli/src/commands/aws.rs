//! AWS credential commands.

use crate::{render, Context};
use chief_plugins::aws::{self, AwsCredentials};
use clap::Args;

/// AWS command arguments.
#[derive(Args)]
pub struct AwsArgs {
    #[command(subcommand)]
    pub command: AwsCommand,
}

#[derive(clap::Subcommand)]
pub enum AwsCommand {
    /// Make a profile the default one
    SetRole {
        /// Profile name in the credentials file
        role: String,

        /// Region to set on the default profile
        #[arg(short, long)]
        region: String,

        /// Export the credentials to the shell and move the file aside
        #[arg(long)]
        export: bool,
    },

    /// List profiles in the credentials file
    Roles,
}

/// Run the aws command.
pub fn run(args: AwsArgs, ctx: &Context) -> anyhow::Result<()> {
    let path = aws::credentials_path(&ctx.session, &ctx.config.aws);

    match args.command {
        AwsCommand::SetRole {
            role,
            region,
            export,
        } => {
            if export {
                ctx.ensure_eval_target("AWS credentials")?;
            }
            if let Some(script) = aws::set_role(&path, &role, &region, export)? {
                ctx.emit_shell(&script)?;
                render::hint(format!(
                    "{} moved to {}",
                    path.display(),
                    aws::backup_path(&path).display()
                ));
            }
            render::success(format!("Default AWS role is now '{role}' in {region}"));
        }

        AwsCommand::Roles => {
            let credentials = AwsCredentials::open(&path)?;
            for role in credentials.roles() {
                println!("{role}");
            }
        }
    }

    Ok(())
}
