//! Terminal rendering utilities.
//!
//! Everything here writes to stderr: stdout is reserved for shell code and
//! command output that users pipe or evaluate.

use chief_core::Prompter;
use chief_plugins::ssh::KeyPairEntry;
use chief_plugins::venv::VenvDescriptor;
use console::{style, Emoji};
use std::io::{self, Write};
use std::path::Path;

pub static CHECK: Emoji = Emoji("✓", "+");
pub static CROSS: Emoji = Emoji("✗", "x");
pub static WARN: Emoji = Emoji("⚠", "!");

/// Report a completed action.
pub fn success(message: impl AsRef<str>) {
    eprintln!("{} {}", style(CHECK).green(), message.as_ref());
}

/// Report a non-fatal problem.
pub fn warn(message: impl AsRef<str>) {
    eprintln!("{} {}", style(WARN).yellow(), message.as_ref());
}

/// Report a failed command, including its cause chain.
pub fn error(err: &anyhow::Error) {
    eprintln!("{} {}", style(CROSS).red().bold(), style(err).red());
    for cause in err.chain().skip(1) {
        eprintln!("    {}", style(format!("caused by: {cause}")).dim());
    }
}

/// Print a dimmed hint line.
pub fn hint(message: impl AsRef<str>) {
    eprintln!("  {}", style(message.as_ref()).dim());
}

/// Print a section heading.
pub fn heading(title: &str) {
    eprintln!("{}", style(title).bold());
}

/// List virtual environments, marking the active one.
pub fn venv_list(venvs: &[VenvDescriptor], active: Option<&Path>) {
    if venvs.is_empty() {
        hint("No virtual environments found in the current or home directory.");
        return;
    }
    for venv in venvs {
        let marker = if Some(venv.path.as_path()) == active {
            style("*").green().bold().to_string()
        } else {
            " ".to_string()
        };
        let scope = if venv.is_local { "local" } else { "home" };
        eprintln!(
            "  {} {:<20} {} {}",
            marker,
            style(&venv.name).cyan(),
            style(format!("[{scope}]")).dim(),
            venv.path.display()
        );
    }
}

/// List SSH key pairs.
pub fn key_list(keys: &[KeyPairEntry]) {
    if keys.is_empty() {
        hint("No key pairs found.");
        return;
    }
    for key in keys {
        eprintln!(
            "  {:<24} {}",
            style(&key.name).cyan(),
            style(key.public_path.display()).dim()
        );
    }
}

/// Prompter that reads answers from stdin.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn confirm(&self, question: &str, default_yes: bool) -> io::Result<bool> {
        let suffix = if default_yes { "[Y/n]" } else { "[y/N]" };
        eprint!("{} {} {} ", style("?").yellow().bold(), question, style(suffix).dim());
        io::stderr().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(parse_answer(&input, default_yes))
    }
}

/// Interpret a yes/no answer; anything unrecognised is "no".
pub fn parse_answer(input: &str, default_yes: bool) -> bool {
    match input.trim().to_lowercase().as_str() {
        "" => default_yes,
        "y" | "yes" => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        assert!(parse_answer("y\n", false));
        assert!(parse_answer("YES", false));
        assert!(parse_answer("\n", true));
        assert!(!parse_answer("\n", false));
        assert!(!parse_answer("sure", true));
    }
}
