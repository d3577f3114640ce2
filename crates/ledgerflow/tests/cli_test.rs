#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! へ移行

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// 空のホームディレクトリを向いた `lflow`
fn lflow(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("lflow").unwrap();
    cmd.env("LEDGERFLOW_HOME", home.path())
        .env("LEDGERFLOW_CONFIG", home.path().join("config.yml"))
        .env_remove("RUST_LOG");
    cmd
}

/// CLIヘルプに全コマンドが並ぶことを確認
#[test]
fn test_cli_help() {
    let home = tempfile::tempdir().unwrap();
    lflow(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("reset"))
        .stdout(predicate::str::contains("remove"))
        .stdout(predicate::str::contains("pull"))
        .stdout(predicate::str::contains("upgrade"))
        .stdout(predicate::str::contains("accounts"));
}

#[test]
fn test_cli_version() {
    let home = tempfile::tempdir().unwrap();
    lflow(&home)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ledgerflow"));
}

#[test]
fn test_init_help_lists_provider_flags() {
    let home = tempfile::tempdir().unwrap();
    lflow(&home)
        .args(["init", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--blockchain-provider"))
        .stdout(predicate::str::contains("--token-providers"))
        .stdout(predicate::str::contains("--prometheus-enabled"));
}

#[test]
fn test_ls_without_stacks() {
    let home = tempfile::tempdir().unwrap();
    lflow(&home)
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("No stacks yet"));
}

#[test]
fn test_start_unknown_stack_fails() {
    let home = tempfile::tempdir().unwrap();
    lflow(&home)
        .args(["start", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("stack 'missing' does not exist"));
}

#[test]
fn test_remove_unknown_stack_fails_before_prompting() {
    let home = tempfile::tempdir().unwrap();
    lflow(&home)
        .args(["remove", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_accounts_unknown_stack_fails() {
    let home = tempfile::tempdir().unwrap();
    lflow(&home)
        .args(["accounts", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("stack 'missing' does not exist"));
}

#[test]
fn test_init_rejects_bad_input() {
    let home = tempfile::tempdir().unwrap();
    lflow(&home)
        .args(["init", "-bad"])
        .assert()
        .failure();

    lflow(&home)
        .args(["init", "demo", "2", "--blockchain-provider", "quorum"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown blockchain provider 'quorum'"));

    lflow(&home)
        .args(["init", "demo", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid member count 0"));

    assert!(!home.path().join("stacks/demo").exists());
}
