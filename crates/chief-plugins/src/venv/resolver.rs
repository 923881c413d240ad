//! Virtual environment lookup.

use crate::error::{PluginError, Result};
use chief_core::{paths, Session};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A virtual environment located on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenvDescriptor {
    /// Directory name.
    pub name: String,

    /// Interpreter that created it, or the environment's own interpreter.
    pub python: String,

    /// Absolute directory.
    pub path: PathBuf,

    /// Whether the environment lives under the working directory.
    pub is_local: bool,
}

impl VenvDescriptor {
    /// Describe the environment at `path` as seen from `session`.
    pub fn at(session: &Session, path: PathBuf, python: impl Into<String>) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        let is_local = session.cwd() != session.home() && paths::is_within(&path, session.cwd());
        Self {
            name,
            python: python.into(),
            path,
            is_local,
        }
    }
}

/// Names containing `/` or `~` are paths rather than environment names.
pub fn is_explicit_path(name: &str) -> bool {
    name.contains('/') || name.contains('~')
}

/// Reject plain names that would escape the directory they are joined to.
///
/// Explicit paths and missing names pass through unchanged.
pub fn validate_name(name: Option<&str>) -> Result<()> {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) if is_explicit_path(n) => Ok(()),
        Some(n) if n == "." || n == ".." || n.contains('\\') => Err(PluginError::invalid(format!(
            "venv name '{n}' must be a plain directory name"
        ))),
        _ => Ok(()),
    }
}

/// Activation script inside an environment.
pub fn activation_script(venv: &Path) -> PathBuf {
    if cfg!(windows) {
        venv.join("Scripts").join("activate")
    } else {
        venv.join("bin").join("activate")
    }
}

/// Interpreter inside an environment.
pub fn python_bin(venv: &Path) -> PathBuf {
    if cfg!(windows) {
        venv.join("Scripts").join("python.exe")
    } else {
        venv.join("bin").join("python")
    }
}

/// Candidate directories for `name`, in search order.
///
/// - explicit path: just that path
/// - `name`: `./name`, `~/.name`, `./.name`
/// - no name: `~/.venv`, `./.venv`, `./venv`
pub fn candidates(session: &Session, name: Option<&str>) -> Vec<PathBuf> {
    let cwd = session.cwd();
    let home = session.home();

    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) if is_explicit_path(n) => vec![session.resolve_path(n)],
        Some(n) => vec![
            cwd.join(n),
            home.join(format!(".{n}")),
            cwd.join(format!(".{n}")),
        ],
        None => vec![home.join(".venv"), cwd.join(".venv"), cwd.join("venv")],
    }
}

/// Find an existing environment directory for `name`.
pub fn resolve(session: &Session, name: Option<&str>) -> Result<VenvDescriptor> {
    validate_name(name)?;
    let searched = candidates(session, name);

    for path in &searched {
        debug!("Checking for venv at {}", path.display());
        if path.is_dir() {
            let python = python_bin(path).to_string_lossy().into_owned();
            return Ok(VenvDescriptor::at(session, path.clone(), python));
        }
    }

    Err(PluginError::VenvNotFound {
        name: name.unwrap_or_default().to_string(),
        searched,
    })
}

/// Environments directly under the working directory and home.
///
/// A directory counts when it holds an activation script. Unreadable
/// directories are skipped.
pub fn discover(session: &Session) -> Vec<VenvDescriptor> {
    let mut roots = vec![session.cwd().to_path_buf()];
    if session.home() != session.cwd() {
        roots.push(session.home().to_path_buf());
    }

    let mut found = Vec::new();
    for root in roots {
        let entries = match fs::read_dir(&root) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Skipping {}: {}", root.display(), e);
                continue;
            }
        };

        let mut here: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_dir() && activation_script(path).is_file())
            .collect();
        here.sort();

        found.extend(here.into_iter().map(|path| {
            let python = python_bin(&path).to_string_lossy().into_owned();
            VenvDescriptor::at(session, path, python)
        }));
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Fixture {
        _home: TempDir,
        _cwd: TempDir,
        session: Session,
    }

    fn fixture() -> Fixture {
        let home = TempDir::new().unwrap();
        let cwd = TempDir::new().unwrap();
        let session = Session::new(home.path(), cwd.path());
        Fixture {
            _home: home,
            _cwd: cwd,
            session,
        }
    }

    fn make_venv(path: &Path) {
        let script = activation_script(path);
        fs::create_dir_all(script.parent().unwrap()).unwrap();
        fs::write(script, "# activate\n").unwrap();
    }

    #[test]
    fn test_candidate_order_for_name() {
        let f = fixture();
        let s = &f.session;
        assert_eq!(
            candidates(s, Some("proj")),
            vec![
                s.cwd().join("proj"),
                s.home().join(".proj"),
                s.cwd().join(".proj"),
            ]
        );
    }

    #[test]
    fn test_candidate_order_without_name() {
        let f = fixture();
        let s = &f.session;
        let expected = vec![
            s.home().join(".venv"),
            s.cwd().join(".venv"),
            s.cwd().join("venv"),
        ];
        assert_eq!(candidates(s, None), expected);
        assert_eq!(candidates(s, Some("  ")), expected);
    }

    #[test]
    fn test_explicit_path_round_trips() {
        let f = fixture();
        let s = &f.session;

        assert_eq!(candidates(s, Some("~/envs/p")), vec![s.home().join("envs/p")]);
        assert_eq!(
            candidates(s, Some("./sub/../envs/p")),
            vec![s.cwd().join("envs/p")]
        );
    }

    #[test]
    fn test_resolve_prefers_local_plain_name() {
        let f = fixture();
        let s = &f.session;
        make_venv(&s.cwd().join("proj"));
        make_venv(&s.home().join(".proj"));

        let venv = resolve(s, Some("proj")).unwrap();
        assert_eq!(venv.path, s.cwd().join("proj"));
        assert_eq!(venv.name, "proj");
        assert!(venv.is_local);
    }

    #[test]
    fn test_resolve_home_dot_name() {
        let f = fixture();
        let s = &f.session;
        make_venv(&s.home().join(".proj"));

        let venv = resolve(s, Some("proj")).unwrap();
        assert_eq!(venv.path, s.home().join(".proj"));
        assert_eq!(venv.name, ".proj");
        assert!(!venv.is_local);
    }

    #[test]
    fn test_resolve_default_names() {
        let f = fixture();
        let s = &f.session;
        fs::create_dir_all(s.cwd().join("venv")).unwrap();

        let venv = resolve(s, None).unwrap();
        assert_eq!(venv.path, s.cwd().join("venv"));
    }

    #[test]
    fn test_resolve_ignores_plain_files() {
        let f = fixture();
        let s = &f.session;
        fs::write(s.cwd().join("proj"), "not a dir").unwrap();

        assert!(matches!(
            resolve(s, Some("proj")),
            Err(PluginError::VenvNotFound { .. })
        ));
    }

    #[test]
    fn test_dot_names_are_rejected() {
        let f = fixture();
        let s = &f.session;
        for name in [".", "..", " .. ", "a\\b"] {
            assert!(
                matches!(resolve(s, Some(name)), Err(PluginError::InvalidArgument(_))),
                "{name:?} should be rejected"
            );
        }
        assert!(validate_name(Some("../envs/p")).is_ok());
        assert!(validate_name(Some(".hidden")).is_ok());
        assert!(validate_name(None).is_ok());
    }

    #[test]
    fn test_resolve_missing_reports_searched_paths() {
        let f = fixture();
        match resolve(&f.session, Some("ghost")) {
            Err(PluginError::VenvNotFound { name, searched }) => {
                assert_eq!(name, "ghost");
                assert_eq!(searched.len(), 3);
            }
            other => panic!("expected VenvNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_discover_lists_activatable_dirs() {
        let f = fixture();
        let s = &f.session;
        make_venv(&s.cwd().join(".venv"));
        make_venv(&s.home().join(".tools"));
        fs::create_dir_all(s.cwd().join("src")).unwrap();

        let names: Vec<String> = discover(s).into_iter().map(|v| v.name).collect();
        assert_eq!(names, vec![".venv", ".tools"]);
    }

    #[test]
    fn test_discover_empty_and_unreadable() {
        let session = Session::new("/nonexistent/home", "/nonexistent/cwd");
        assert!(discover(&session).is_empty());
    }
}
