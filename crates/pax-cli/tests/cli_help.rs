use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("pax-construct")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("import-bundle"))
        .stdout(predicate::str::contains("move-bundle"))
        .stdout(predicate::str::contains("remove-bundle"))
        .stdout(predicate::str::contains("provision"));
}

#[test]
fn test_unknown_command_fails() {
    Command::cargo_bin("pax-construct")
        .unwrap()
        .arg("bogus")
        .assert()
        .failure();
}
