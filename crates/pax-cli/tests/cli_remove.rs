mod common;

use common::Workspace;
use predicates::prelude::*;

#[test]
fn test_remove_bundle() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["remove-bundle", "foo"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Removed"));

    assert!(!ws.project().join("bundles/foo").exists());
    assert!(!ws.read("bundles/pom.xml").contains("<module>foo</module>"));
}

#[test]
fn test_remove_aggregator_is_refused() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["remove-bundle", "bundles"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a bundle"));

    assert!(ws.project().join("bundles/foo/pom.xml").is_file());
}
