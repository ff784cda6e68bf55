mod common;

use common::Workspace;
use predicates::prelude::*;

#[test]
fn test_provision_without_deploy() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["provision", "--deploy", "false"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Provisioned"))
        .stderr(predicate::str::contains("org.example:foo:1.0"));

    let pom = ws.read("target/deployment/pom.xml");
    assert!(pom.contains("<groupId>org.example.app.build</groupId>"));
    assert!(pom.contains("<artifactId>deployment</artifactId>"));
    assert!(ws
        .repo()
        .join("org/example/app/build/deployment/1.0/deployment-1.0.pom")
        .is_file());
}

#[test]
fn test_provision_reports_missing_runner() {
    let ws = Workspace::new();

    ws.cmd()
        .arg("provision")
        .assert()
        .failure();

    assert!(ws.project().join("target/deployment/pom.xml").is_file());
}
