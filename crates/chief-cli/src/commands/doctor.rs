//! Diagnostic commands.

use crate::render::{CHECK, CROSS, WARN};
use crate::Context;
use chief_exec::ProcessRunner;
use chief_plugins::aws;
use chief_plugins::ssh::SshDir;
use chief_plugins::vault::{Vault, VaultFileReference};
use clap::Args;
use console::style;

/// Doctor command arguments.
#[derive(Args)]
pub struct DoctorArgs {}

#[derive(Default)]
struct Tally {
    errors: usize,
    warnings: usize,
}

impl Tally {
    fn ok(&self, message: impl AsRef<str>) {
        println!("  {} {}", style(CHECK).green(), message.as_ref());
    }

    fn warn(&mut self, message: impl AsRef<str>) {
        println!("  {} {}", style(WARN).yellow(), message.as_ref());
        self.warnings += 1;
    }

    fn error(&mut self, message: impl AsRef<str>) {
        println!("  {} {}", style(CROSS).red(), message.as_ref());
        self.errors += 1;
    }
}

/// Run the doctor command.
pub fn run(_args: DoctorArgs, ctx: &Context) -> anyhow::Result<()> {
    println!("chief doctor\n");
    let mut tally = Tally::default();
    let vault = Vault::from_config(&ctx.session, &ctx.config.vault);

    println!("Checking configuration...");
    match ctx.config_path() {
        Some(path) if path.exists() => tally.ok(format!("Config file {}", path.display())),
        Some(path) => println!("  {} No config file at {}, using defaults", style("-").dim(), path.display()),
        None => tally.warn("Could not determine the config file location"),
    }
    match ctx.config.validate() {
        Ok(()) => tally.ok("Configuration valid"),
        Err(e) => tally.error(format!("Configuration invalid: {e}")),
    }

    println!("\nChecking tools...");
    let editor = vault.editor().split_whitespace().next().unwrap_or_default().to_string();
    let tools = [
        ("ssh-keygen", true),
        ("ssh-add", false),
        (ctx.config.python.interpreter.as_str(), true),
        (ctx.config.vault.program.as_str(), false),
        (editor.as_str(), false),
    ];
    for (program, required) in tools {
        match ProcessRunner::locate(program) {
            Ok(path) => tally.ok(format!("{} ({})", program, path.display())),
            Err(_) if required => tally.error(format!("{program} not found on PATH")),
            Err(_) => tally.warn(format!("{program} not found on PATH")),
        }
    }

    println!("\nChecking files...");
    let ssh_dir = SshDir::from_config(&ctx.session, &ctx.config.ssh);
    if ssh_dir.path().is_dir() {
        tally.ok(format!("SSH directory {}", ssh_dir.path().display()));
    } else {
        tally.warn(format!("SSH directory {} missing", ssh_dir.path().display()));
    }

    let secrets = vault.resolve_file(&ctx.session, None);
    match VaultFileReference::inspect(&secrets) {
        Ok(reference) if reference.encrypted => {
            tally.ok(format!("Vault {} is encrypted", secrets.display()))
        }
        Ok(_) => tally.error(format!("Vault {} is NOT encrypted", secrets.display())),
        Err(_) => println!("  {} No vault at {}", style("-").dim(), secrets.display()),
    }

    let credentials = aws::credentials_path(&ctx.session, &ctx.config.aws);
    if credentials.is_file() {
        tally.ok(format!("AWS credentials {}", credentials.display()));
    } else if aws::backup_path(&credentials).is_file() {
        tally.warn(format!(
            "AWS credentials were exported; backup at {}",
            aws::backup_path(&credentials).display()
        ));
    }

    println!("\nChecking session...");
    match ctx.session.active_venv() {
        Some(venv) if venv.is_dir() => tally.ok(format!("Active venv {}", venv.display())),
        Some(venv) => tally.warn(format!("Active venv {} no longer exists", venv.display())),
        None => println!("  {} No active venv", style("-").dim()),
    }
    if ctx.has_eval_target() {
        tally.ok("Shell function installed");
    } else {
        tally.warn("Shell function not installed; add `eval \"$(chief shell-init)\"` to your rc file");
    }

    println!("\n{}", style("Summary").bold());
    println!(
        "  Errors: {}",
        if tally.errors > 0 { style(tally.errors).red() } else { style(tally.errors).green() }
    );
    println!(
        "  Warnings: {}",
        if tally.warnings > 0 { style(tally.warnings).yellow() } else { style(tally.warnings).green() }
    );

    if tally.errors > 0 {
        anyhow::bail!("{} error(s) found", tally.errors);
    }

    Ok(())
}
