//! Environment variable handling.

use std::collections::HashMap;
use std::env;

/// Snapshot of the current process environment.
pub fn snapshot() -> HashMap<String, String> {
    env::vars().collect()
}

/// Quote a value for a POSIX shell single-quoted string.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Common environment variable names.
pub mod vars {
    /// Current vault file, set after a successful `vault load`.
    pub const CHIEF_SECRETS_FILE: &str = "CHIEF_SECRETS_FILE";

    /// Active virtual environment, set by the venv activation script.
    pub const VIRTUAL_ENV: &str = "VIRTUAL_ENV";

    /// Preferred editor for vault files.
    pub const EDITOR: &str = "EDITOR";

    /// Current user name, used as the default key comment.
    pub const USER: &str = "USER";

    /// chief config file override.
    pub const CHIEF_CONFIG: &str = "CHIEF_CONFIG";

    /// chief log filter.
    pub const CHIEF_LOG: &str = "CHIEF_LOG";
}
