//! Shell integration.
//!
//! A child process cannot change its parent's environment, so `chief` runs
//! behind a shell function. The function points `CHIEF_EVAL_FILE` at a
//! private temp file, runs the binary and sources whatever it wrote there.

use clap::{Args, ValueEnum};

/// Shell-init command arguments.
#[derive(Args)]
pub struct ShellInitArgs {
    /// Target shell
    #[arg(value_enum, default_value_t = Shell::Bash)]
    pub shell: Shell,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
}

const FUNCTION: &str = r#"chief() {
    local chief_eval chief_status
    chief_eval="$(mktemp "${TMPDIR:-/tmp}/chief.XXXXXX")" || return 1
    CHIEF_EVAL_FILE="$chief_eval" command chief "$@"
    chief_status=$?
    if [ -s "$chief_eval" ]; then
        . "$chief_eval"
    fi
    rm -f "$chief_eval"
    return $chief_status
}
"#;

/// Shell code defining the `chief` function.
pub fn wrapper(shell: Shell) -> String {
    let rc = match shell {
        Shell::Bash => "~/.bashrc",
        Shell::Zsh => "~/.zshrc",
    };
    format!("# chief shell integration. Add to {rc}:\n#   eval \"$(chief shell-init)\"\n{FUNCTION}")
}
