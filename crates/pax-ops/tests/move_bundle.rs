mod common;

use common::Fixture;
use pax_maven::document::PomDocument;
use pax_ops::ops_move::{move_bundle, MoveOptions};
use pax_util::errors::PaxError;

fn options(fixture: &Fixture, bundle: &str, target: &str) -> MoveOptions {
    MoveOptions {
        base_directory: fixture.root(),
        bundle_name: bundle.to_string(),
        target_directory: target.into(),
    }
}

#[test]
fn move_down_creates_aggregator_and_deepens_parent_path() {
    let fixture = Fixture::new();
    let summary = move_bundle(&options(&fixture, "foo", "bundles/extra")).unwrap();

    assert_eq!(summary.from, fixture.path("bundles/foo"));
    assert_eq!(summary.to, fixture.path("bundles/extra/foo"));
    assert_eq!(summary.relative_offset, 1);
    assert_eq!(summary.created, vec![fixture.path("bundles/extra")]);
    assert!(!fixture.path("bundles/foo").exists());

    let moved = PomDocument::read(&fixture.path("bundles/extra/foo")).unwrap();
    assert_eq!(moved.relative_path().as_deref(), Some("../../pom.xml"));

    let extra = PomDocument::read(&fixture.path("bundles/extra")).unwrap();
    assert_eq!(extra.group_id().as_deref(), Some("org.example.bundles"));
    assert_eq!(extra.artifact_id().as_deref(), Some("extra"));
    assert_eq!(extra.packaging(), "pom");
    assert_eq!(extra.modules(), vec!["foo".to_string()]);

    let bundles = PomDocument::read(&fixture.path("bundles")).unwrap();
    assert_eq!(bundles.modules(), vec!["extra".to_string()]);
}

#[test]
fn move_up_shortens_parent_path() {
    let fixture = Fixture::new();
    move_bundle(&options(&fixture, "foo", "bundles/extra")).unwrap();

    let summary = move_bundle(&options(&fixture, "bundles/extra/foo", "bundles")).unwrap();
    assert_eq!(summary.relative_offset, -1);
    assert!(summary.created.is_empty());

    let moved = PomDocument::read(&fixture.path("bundles/foo")).unwrap();
    assert_eq!(moved.relative_path().as_deref(), Some("../pom.xml"));

    let bundles = PomDocument::read(&fixture.path("bundles")).unwrap();
    assert!(bundles.has_module("foo"));
    let extra = PomDocument::read(&fixture.path("bundles/extra")).unwrap();
    assert!(extra.modules().is_empty());
}

#[test]
fn sideways_move_keeps_parent_path() {
    let fixture = Fixture::new();
    let summary = move_bundle(&options(&fixture, "org.example.foo", "provision")).unwrap();
    assert_eq!(summary.relative_offset, 0);
    let moved = PomDocument::read(&fixture.path("provision/foo")).unwrap();
    assert_eq!(moved.relative_path().as_deref(), Some("../pom.xml"));
    assert!(PomDocument::read(&fixture.path("provision")).unwrap().has_module("foo"));
    assert!(!PomDocument::read(&fixture.path("bundles")).unwrap().has_module("foo"));
}

#[test]
fn collision_leaves_everything_untouched() {
    let fixture = Fixture::new();
    std::fs::create_dir_all(fixture.path("provision/foo")).unwrap();
    let provision_before = fixture.pom("provision");
    let bundles_before = fixture.pom("bundles");
    let foo_before = fixture.pom("bundles/foo");

    let err = move_bundle(&options(&fixture, "foo", "provision")).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PaxError>(),
        Some(PaxError::MoveFailed { .. })
    ));

    assert_eq!(fixture.pom("provision"), provision_before);
    assert_eq!(fixture.pom("bundles"), bundles_before);
    assert_eq!(fixture.pom("bundles/foo"), foo_before);
}

#[test]
fn target_outside_project_is_rejected() {
    let fixture = Fixture::new();
    let outside = fixture.tmp.path().join("elsewhere");
    let err = move_bundle(&MoveOptions {
        base_directory: fixture.root(),
        bundle_name: "foo".into(),
        target_directory: outside.clone(),
    })
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PaxError>(),
        Some(PaxError::TreeBoundary { .. })
    ));
    assert!(!outside.exists());
    assert!(fixture.path("bundles/foo/pom.xml").is_file());
}

#[test]
fn moving_into_own_subtree_fails() {
    let fixture = Fixture::new();
    let err = move_bundle(&options(&fixture, "bundles", "bundles/foo")).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PaxError>(),
        Some(PaxError::MoveFailed { .. })
    ));
}

#[test]
fn unknown_bundle_is_not_found() {
    let fixture = Fixture::new();
    let err = move_bundle(&options(&fixture, "missing", "provision")).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PaxError>(),
        Some(PaxError::NotFound { .. })
    ));
}

#[test]
fn move_from_source_directory_uses_enclosing_project() {
    let fixture = Fixture::new();
    let sources = fixture.path("bundles/foo/src/main/java");
    std::fs::create_dir_all(&sources).unwrap();

    let summary = move_bundle(&MoveOptions {
        base_directory: sources,
        bundle_name: "foo".into(),
        target_directory: fixture.path("provision"),
    })
    .unwrap();
    assert_eq!(summary.to, fixture.path("provision/foo"));
    assert!(fixture.path("provision/foo/src/main/java").is_dir());
}

#[test]
fn failed_bookkeeping_after_rename_is_reported_as_inconsistency() {
    let fixture = Fixture::new();
    // old parent manifest becomes unreadable, but the module is still
    // reachable by path
    std::fs::remove_file(fixture.path("bundles/pom.xml")).unwrap();
    std::fs::create_dir(fixture.path("bundles/pom.xml")).unwrap();

    let err = move_bundle(&options(&fixture, "bundles/foo", "provision")).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PaxError>(),
        Some(PaxError::PostMoveInconsistency { .. })
    ));
    assert!(!fixture.path("bundles/foo").exists());
    assert!(fixture.path("provision/foo/pom.xml").is_file());
}
