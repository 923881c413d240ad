//! Vault and SSH key flows driven end to end through a recording runner.

use chief_core::config::{KeyType, SshConfig, VaultConfig};
use chief_core::env::vars;
use chief_core::ScriptedPrompter;
use chief_exec::{ExecutionOutput, RecordingRunner};
use chief_integration_tests::{target_of, Workspace};
use chief_plugins::ssh::SshDir;
use chief_plugins::vault::{EditOutcome, Vault};
use std::fs;

const MARKER: &str = "$ANSIBLE_VAULT;1.1;AES256\n";

#[tokio::test]
async fn test_new_vault_is_encrypted_then_loaded() {
    let ws = Workspace::new();
    let mut session = ws.session().with_var(vars::EDITOR, "fake-editor");
    let runner = RecordingRunner::new()
        .on("fake-editor", |spec| {
            fs::write(target_of(spec), "export TOKEN=abc\n")?;
            Ok(ExecutionOutput::ok(""))
        })
        .on("ansible-vault", |spec| match spec.args.first().map(String::as_str) {
            Some("encrypt") => {
                fs::write(target_of(spec), format!("{MARKER}616263\n"))?;
                Ok(ExecutionOutput::ok(""))
            }
            Some("view") => Ok(ExecutionOutput::ok("export TOKEN=abc")),
            Some("edit") => Ok(ExecutionOutput::ok("")),
            _ => Ok(ExecutionOutput::failed(2)),
        });
    let vault = Vault::from_config(&session, &VaultConfig::default());

    let (file, outcome) = vault.edit(&session, &runner, None).await.unwrap();
    assert_eq!(outcome, EditOutcome::Created);
    assert_eq!(file, ws.home.path().join(".chief_secrets.sh"));
    assert!(fs::read_to_string(&file).unwrap().starts_with(MARKER));

    let script = vault.load(&mut session, &runner, None).await.unwrap();
    assert_eq!(
        script,
        format!("export TOKEN=abc\nexport CHIEF_SECRETS_FILE='{}'\n", file.display())
    );
    assert_eq!(session.secrets_file(), Some(file.as_path()));

    // The loaded vault becomes the default for the next edit.
    let vault = Vault::from_config(&session, &VaultConfig::default());
    let (_, outcome) = vault.edit(&session, &runner, None).await.unwrap();
    assert_eq!(outcome, EditOutcome::Edited);
    assert_eq!(runner.calls_to("ansible-vault").last().unwrap().args[0], "edit");
}

#[tokio::test]
async fn test_key_pair_then_pubkey_and_list() {
    let ws = Workspace::new();
    let session = ws.session().with_var(vars::USER, "dev");
    let runner = RecordingRunner::new().on("ssh-keygen", |spec| {
        if spec.has_arg("-y") {
            return Ok(ExecutionOutput::ok("ssh-rsa AAAAB3 dev\n"));
        }
        let private = target_of(spec);
        fs::write(&private, "PRIVATE")?;
        fs::write(format!("{}.pub", private.display()), "ssh-rsa AAAAB3 dev\n")?;
        Ok(ExecutionOutput::ok(""))
    });
    let prompter = ScriptedPrompter::default();
    let dir = SshDir::from_config(&session, &SshConfig::default());

    let key = dir
        .create_key_pair(&session, &runner, &prompter, Some("work"), KeyType::Rsa, None)
        .await
        .unwrap();
    assert_eq!(key.private_path, ws.home.path().join(".ssh").join("work.key"));
    assert_eq!(key.comment, "dev");

    let call = &runner.calls_to("ssh-keygen")[0];
    let position = call.args.iter().position(|a| a == "-b").unwrap();
    assert_eq!(call.args[position + 1], "4096");

    let public = chief_plugins::ssh::extract_public_key(&session, &runner, "~/.ssh/work.key")
        .await
        .unwrap();
    assert_eq!(public, "ssh-rsa AAAAB3 dev");

    let keys = dir.list_keys().unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].name, "work.key");

    let loaded = dir.load_keys(&runner).await.unwrap();
    assert_eq!(loaded, vec![key.private_path.clone()]);
    assert_eq!(runner.calls_to("ssh-add").len(), 1);
}
