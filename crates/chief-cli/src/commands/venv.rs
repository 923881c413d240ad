//! Python virtual environment commands.

use crate::{render, Context};
use chief_plugins::venv::{self, CreateOptions};
use chief_plugins::PluginError;
use clap::Args;
use console::Term;

/// Venv command arguments.
#[derive(Args)]
pub struct VenvArgs {
    #[command(subcommand)]
    pub command: VenvCommand,
}

#[derive(clap::Subcommand)]
pub enum VenvCommand {
    /// Create a virtual environment (`~/.name`, or `./.venv` without a name)
    Create {
        /// Environment name or path
        name: Option<String>,

        /// Interpreter to create it with
        #[arg(short, long)]
        python: Option<String>,

        /// Create `./.name` in the working directory
        #[arg(short, long)]
        local: bool,

        /// Do not add local environments to .gitignore
        #[arg(long)]
        no_gitignore: bool,
    },

    /// Activate a virtual environment in the calling shell
    Start {
        /// Environment name or path
        name: Option<String>,
    },

    /// Deactivate the active virtual environment
    Stop,

    /// List environments in the working and home directories
    List,

    /// Install a requirements file into the active environment
    Install {
        /// Requirements file
        #[arg(short = 'r', long = "requirement")]
        file: Option<String>,
    },

    /// Write the active environment's packages to a requirements file
    Freeze {
        /// Output file
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Run the venv command.
pub async fn run(args: VenvArgs, ctx: &mut Context) -> anyhow::Result<()> {
    match args.command {
        VenvCommand::Create {
            name,
            python,
            local,
            no_gitignore,
        } => {
            let options = CreateOptions {
                python: python.unwrap_or_else(|| ctx.config.python.interpreter.clone()),
                local,
                gitignore: ctx.config.python.gitignore && !no_gitignore,
            };
            let created = venv::create(
                &ctx.session,
                &ctx.runner,
                &ctx.prompter,
                name.as_deref(),
                &options,
            )
            .await?;

            let verb = if created.recreated { "Recreated" } else { "Created" };
            render::success(format!(
                "{} {} with {}",
                verb,
                created.venv.path.display(),
                options.python
            ));
            if created.ignored {
                render::hint(format!("Added {}/ to .gitignore", created.venv.name));
            }
            render::hint(format!(
                "Activate it with: chief venv start {}",
                name.as_deref().unwrap_or_default()
            ));
        }

        VenvCommand::Start { name } => {
            let activation = match venv::start(&mut ctx.session, &ctx.prompter, name.as_deref()) {
                Ok(activation) => activation,
                Err(err @ PluginError::VenvNotFound { .. }) => {
                    let available = venv::discover(&ctx.session);
                    if !available.is_empty() {
                        render::heading("Available environments:");
                        render::venv_list(&available, ctx.session.active_venv());
                    }
                    return Err(err.into());
                }
                Err(err) => return Err(err.into()),
            };

            ctx.emit_shell(&activation.shell_code())?;
            shell_hint(ctx);
            render::success(format!("Activated {}", activation.venv.path.display()));
        }

        VenvCommand::Stop => {
            let previous = venv::stop(&mut ctx.session)?;
            ctx.emit_shell("deactivate\n")?;
            shell_hint(ctx);
            render::success(format!("Deactivated {}", previous.display()));
        }

        VenvCommand::List => {
            let venvs = venv::discover(&ctx.session);
            render::venv_list(&venvs, ctx.session.active_venv());
        }

        VenvCommand::Install { file } => {
            let requirements =
                venv::install_requirements(&ctx.session, &ctx.runner, file.as_deref()).await?;
            render::success(format!("Installed {}", requirements.display()));
        }

        VenvCommand::Freeze { output } => {
            let (path, count) = venv::freeze(&ctx.session, &ctx.runner, output.as_deref()).await?;
            render::success(format!("Wrote {} package(s) to {}", count, path.display()));
        }
    }

    Ok(())
}

/// Shell code printed to a terminal is never evaluated.
fn shell_hint(ctx: &Context) {
    if !ctx.has_eval_target() && Term::stdout().is_term() {
        render::warn("Your shell is not running the chief function, nothing changed.");
        render::hint("Add `eval \"$(chief shell-init)\"` to your shell rc file.");
    }
}
