mod common;

use common::Workspace;
use predicates::prelude::*;

#[test]
fn test_move_bundle_into_new_directory() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["move-bundle", "foo", "bundles/extra"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Moved"))
        .stderr(predicate::str::contains("Created"));

    assert!(ws.project().join("bundles/extra/foo/pom.xml").is_file());
    assert!(!ws.project().join("bundles/foo").exists());
    assert!(ws.read("bundles/extra/foo/pom.xml").contains("<relativePath>../../pom.xml</relativePath>"));
    assert!(ws.read("bundles/extra/pom.xml").contains("<module>foo</module>"));
    assert!(!ws.read("bundles/pom.xml").contains("<module>foo</module>"));
}

#[test]
fn test_move_bundle_outside_project_fails() {
    let ws = Workspace::new();
    let outside = ws.tmp.path().join("elsewhere");

    ws.cmd()
        .arg("move-bundle")
        .arg("foo")
        .arg(&outside)
        .assert()
        .failure()
        .stderr(predicate::str::contains("outside"));

    assert!(ws.project().join("bundles/foo/pom.xml").is_file());
}

#[test]
fn test_move_unknown_bundle_fails() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["move-bundle", "nothing-here", "provision"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing-here"));
}
