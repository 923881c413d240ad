//! Virtual environment lifecycle tests: create, start, work, stop.

use chief_core::ScriptedPrompter;
use chief_exec::{ExecutionOutput, RecordingRunner};
use chief_integration_tests::{venv_runner, Workspace};
use chief_plugins::venv::{self, CreateOptions};
use chief_plugins::PluginError;
use std::fs;

#[tokio::test]
async fn test_create_then_start_by_name() {
    let ws = Workspace::new();
    let mut session = ws.session();
    let runner = venv_runner("python3");
    let prompter = ScriptedPrompter::default();

    assert!(!ws.home.path().join(".proj").exists());
    let created = venv::create(&session, &runner, &prompter, Some("proj"), &CreateOptions::default())
        .await
        .unwrap();
    assert_eq!(created.venv.path, ws.home.path().join(".proj"));
    assert!(!created.venv.is_local);
    assert!(!created.recreated);

    let activation = venv::start(&mut session, &prompter, Some("proj")).unwrap();
    assert_eq!(activation.venv.path, ws.home.path().join(".proj"));
    assert_eq!(session.active_venv(), Some(ws.home.path().join(".proj").as_path()));
    assert!(activation.shell_code().starts_with(". '"));
    assert!(prompter.asked().is_empty());

    let stopped = venv::stop(&mut session).unwrap();
    assert_eq!(stopped, ws.home.path().join(".proj"));
    assert!(matches!(venv::stop(&mut session), Err(PluginError::NoActiveVenv)));
}

#[tokio::test]
async fn test_local_venv_is_ignored_and_discovered() {
    let ws = Workspace::new();
    let session = ws.session();
    let runner = venv_runner("python3");
    let prompter = ScriptedPrompter::default();
    let options = CreateOptions {
        local: true,
        ..CreateOptions::default()
    };

    let created = venv::create(&session, &runner, &prompter, Some("tools"), &options)
        .await
        .unwrap();
    assert!(created.venv.is_local);
    assert!(created.ignored);
    assert_eq!(
        fs::read_to_string(ws.cwd.path().join(".gitignore")).unwrap(),
        ".tools/\n"
    );

    let found = venv::discover(&session);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].path, ws.cwd.path().join(".tools"));
}

#[tokio::test]
async fn test_switching_venvs_prompts_once() {
    let ws = Workspace::new();
    let mut session = ws.session();
    let runner = venv_runner("python3");
    let prompter = ScriptedPrompter::new([true]);

    for name in ["one", "two"] {
        venv::create(&session, &runner, &prompter, Some(name), &CreateOptions::default())
            .await
            .unwrap();
    }

    venv::start(&mut session, &prompter, Some("one")).unwrap();
    let activation = venv::start(&mut session, &prompter, Some("two")).unwrap();

    assert_eq!(activation.replaced, Some(ws.home.path().join(".one")));
    assert!(activation.shell_code().starts_with("deactivate\n"));
    assert_eq!(prompter.asked().len(), 1);
}

#[tokio::test]
async fn test_install_and_freeze_use_active_interpreter() {
    let ws = Workspace::new();
    let mut session = ws.session();
    let prompter = ScriptedPrompter::default();
    let runner = venv_runner("python3").on("python", |spec| {
        if spec.has_arg("freeze") {
            Ok(ExecutionOutput::ok("requests==2.31.0\nrich==13.7.0\n"))
        } else {
            Ok(ExecutionOutput::ok(""))
        }
    });

    venv::create(&session, &runner, &prompter, None, &CreateOptions::default())
        .await
        .unwrap();
    venv::start(&mut session, &prompter, None).unwrap();
    assert_eq!(session.active_venv(), Some(ws.cwd.path().join(".venv").as_path()));

    fs::write(ws.cwd.path().join("requirements.txt"), "requests\n").unwrap();
    venv::install_requirements(&session, &runner, None).await.unwrap();

    let (path, count) = venv::freeze(&session, &runner, Some("locked.txt")).await.unwrap();
    assert_eq!(path, ws.cwd.path().join("locked.txt"));
    assert_eq!(count, 2);

    let python = ws.cwd.path().join(".venv").join("bin").join("python");
    let pip_calls = runner.calls_to("python");
    assert!(pip_calls
        .iter()
        .all(|c| c.program == python.to_string_lossy()));
    assert!(pip_calls.iter().any(|c| c.has_arg("-r")));
}

#[tokio::test]
async fn test_failed_create_leaves_nothing_behind() {
    let ws = Workspace::new();
    let session = ws.session();
    let runner = RecordingRunner::new().on("python3", |spec| {
        fs::create_dir_all(chief_integration_tests::target_of(spec)).unwrap();
        Ok(ExecutionOutput::failed(1))
    });
    let prompter = ScriptedPrompter::default();

    let result = venv::create(&session, &runner, &prompter, Some("broken"), &CreateOptions::default()).await;

    assert!(matches!(
        result,
        Err(PluginError::ExternalCommandFailed { code: 1, .. })
    ));
    assert!(!ws.home.path().join(".broken").exists());
}
