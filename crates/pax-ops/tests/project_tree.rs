mod common;

use common::Fixture;
use pax_ops::project_tree::{locate, ProjectTree};

#[test]
fn discovers_root_from_nested_module() {
    let fixture = Fixture::new();
    let tree = ProjectTree::discover(&fixture.path("bundles/foo")).unwrap();
    assert_eq!(tree.root(), fixture.root().as_path());
    assert!(tree.contains(&fixture.path("bundles/new")));
    assert!(!tree.contains(fixture.tmp.path()));
}

#[test]
fn modules_are_listed_breadth_first() {
    let fixture = Fixture::new();
    let tree = ProjectTree::discover(&fixture.root()).unwrap();
    let names: Vec<String> = tree.modules().unwrap().iter().map(|m| m.name()).collect();
    assert_eq!(names, vec!["app", "provision", "bundles", "foo"]);
}

#[test]
fn locate_by_path_and_by_name() {
    let fixture = Fixture::new();
    let by_path = locate(&fixture.root(), "bundles/foo").unwrap();
    let by_id = locate(&fixture.path("provision"), "foo").unwrap();
    let by_symbolic = locate(&fixture.root(), "org.example.foo").unwrap();
    assert_eq!(by_path.directory, by_id.directory);
    assert_eq!(by_path.directory, by_symbolic.directory);
    assert_eq!(by_path.parent_dir(), Some(fixture.path("bundles")));
}

#[test]
fn relative_path_reports_depth_change() {
    let fixture = Fixture::new();
    let tree = ProjectTree::discover(&fixture.root()).unwrap();
    let route = tree
        .relative_path(&fixture.path("bundles"), &fixture.path("provision/deep"))
        .unwrap();
    assert_eq!(route.common, fixture.root());
    assert_eq!(route.depth_delta(), 1);
    assert!(tree
        .relative_path(&fixture.path("bundles"), fixture.tmp.path())
        .is_none());
}

#[test]
fn module_tree_plan_is_lazy_until_applied() {
    let fixture = Fixture::new();
    let tree = ProjectTree::discover(&fixture.root()).unwrap();

    let existing = tree.plan_module_tree(&fixture.path("bundles")).unwrap().unwrap();
    assert_eq!(existing.created_dirs().count(), 0);

    let plan = tree
        .plan_module_tree(&fixture.path("features/core"))
        .unwrap()
        .unwrap();
    assert_eq!(plan.created_dirs().count(), 2);
    assert!(!fixture.path("features").exists());

    let node = plan.apply().unwrap();
    assert_eq!(node.directory, fixture.path("features/core"));
    assert_eq!(node.manifest.group_id().as_deref(), Some("org.example.app.features"));
    assert_eq!(node.parent_path.as_deref(), Some("../pom.xml"));

    let names: Vec<String> = tree.modules().unwrap().iter().map(|m| m.name()).collect();
    assert!(names.contains(&"core".to_string()));
    assert!(tree.plan_module_tree(fixture.tmp.path()).unwrap().is_none());
}

#[test]
fn source_directory_resolves_to_enclosing_project() {
    let fixture = Fixture::new();
    let sources = fixture.path("bundles/foo/src/main/java");
    std::fs::create_dir_all(&sources).unwrap();

    let tree = ProjectTree::discover(&sources).unwrap();
    assert_eq!(tree.root(), fixture.root().as_path());

    let provision = locate(&sources, "provision").unwrap();
    assert_eq!(provision.directory, fixture.path("provision"));
}

#[test]
fn discovery_outside_any_project_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let err = ProjectTree::discover(tmp.path()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<pax_util::errors::PaxError>(),
        Some(pax_util::errors::PaxError::NotFound { .. })
    ));
}

#[test]
fn effective_pom_inherits_managed_versions_from_parents() {
    let fixture = Fixture::new();
    common::write(
        &fixture.path("pom.xml"),
        &common::read(&fixture.path("pom.xml")).replace(
            "  <modules>",
            "  <properties>\n    <fw.version>2.0</fw.version>\n  </properties>\n  <dependencyManagement>\n    <dependencies>\n      <dependency><groupId>org.fw</groupId><artifactId>fw</artifactId><version>${fw.version}</version></dependency>\n    </dependencies>\n  </dependencyManagement>\n  <modules>",
        ),
    );
    let foo = locate(&fixture.root(), "foo").unwrap();
    let pom = foo.effective_pom().unwrap();
    assert_eq!(pom.managed_version("org.fw", "fw"), Some("2.0"));
    assert_eq!(pom.effective_version(), Some("1.0-SNAPSHOT"));
}
