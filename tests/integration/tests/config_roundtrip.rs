//! Config save/load roundtrip and config-driven plugin behaviour.

use chief_core::config::{Config, KeyType};
use chief_integration_tests::Workspace;
use chief_plugins::ssh::SshDir;
use chief_plugins::vault::Vault;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_config_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("chief.json5");

    let mut config = Config::default();
    config.python.interpreter = "python3.12".to_string();
    config.ssh.default_type = KeyType::Rsa;
    config.vault.editor = Some("nano".to_string());
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.python.interpreter, "python3.12");
    assert_eq!(loaded.ssh.default_type, KeyType::Rsa);
    assert_eq!(loaded.vault.editor.as_deref(), Some("nano"));
    assert_eq!(loaded.vault.program, "ansible-vault");
    assert!(loaded.validate().is_ok());
}

#[test]
fn test_hand_written_json5_with_comments() {
    let config = Config::parse(
        r#"{
            // keys live elsewhere on this machine
            ssh: { dir: "~/keys" },
            vault: { secrets_file: "~/secrets/env.sh", },
        }"#,
    )
    .unwrap();

    let ws = Workspace::new();
    let session = ws.session();

    let ssh = SshDir::from_config(&session, &config.ssh);
    assert_eq!(ssh.path(), ws.home.path().join("keys"));

    let vault = Vault::from_config(&session, &config.vault);
    assert_eq!(
        vault.resolve_file(&session, None),
        ws.home.path().join("secrets").join("env.sh")
    );
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let config = Config::load_or_default(Some(Path::new("/nonexistent/chief.json5"))).unwrap();
    assert_eq!(config.python.interpreter, "python3");
    assert!(Config::load(Path::new("/nonexistent/chief.json5")).is_err());
}

#[test]
fn test_config_parse_invalid() {
    assert!(Config::parse("not valid json").is_err());
    assert!(Config::parse(r#"{ ssh: { default_type: "dsa" } }"#).is_err());
}
