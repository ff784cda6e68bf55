//! Editable `pom.xml`: the manifest a project-tree operation reads, mutates
//! and writes back.
//!
//! Edits go through the formatting-preserving tree in [`crate::xml`], so
//! comments, ordering and indentation of untouched sections survive.

use std::fmt;
use std::path::{Path, PathBuf};

use pax_core::coordinate::{compound_id, Coordinate, DependencyEdge};
use pax_core::scope::Scope;
use pax_util::errors::PaxError;

use crate::pom::{self, ParentRef, Pom};
use crate::xml::{Document, Element};

/// File name of a Maven manifest.
pub const POM_FILE: &str = "pom.xml";

/// Maven's implicit `<relativePath>` when a parent declares none.
pub const DEFAULT_RELATIVE_PATH: &str = "../pom.xml";

/// Result of recording a dependency in a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Added,
    /// An entry with the same identity was overwritten in place.
    Replaced,
    /// An entry with the same identity exists and overwrite was off.
    Skipped,
}

impl RecordOutcome {
    pub fn changed(self) -> bool {
        self != RecordOutcome::Skipped
    }
}

/// A dependency entry as declared in a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub type_: String,
    pub scope: Option<String>,
    pub optional: bool,
}

/// An editable POM bound to its file on disk.
#[derive(Debug, Clone)]
pub struct PomDocument {
    file: PathBuf,
    doc: Document,
}

impl PomDocument {
    /// Read `pom.xml` from a directory, or from an explicit file path.
    pub fn read(path: &Path) -> miette::Result<Self> {
        let file = if path.is_dir() {
            path.join(POM_FILE)
        } else {
            path.to_path_buf()
        };
        let xml = std::fs::read_to_string(&file).map_err(|e| PaxError::Manifest {
            message: format!("Failed to read {}: {e}", file.display()),
        })?;
        Self::parse(file, &xml)
    }

    /// Parse manifest text that will later be written to `file`.
    pub fn parse(file: impl Into<PathBuf>, xml: &str) -> miette::Result<Self> {
        let file = file.into();
        let doc = Document::parse(xml).map_err(|e| PaxError::Manifest {
            message: format!("{}: {e}", file.display()),
        })?;
        if doc.root.name != "project" {
            return Err(PaxError::Manifest {
                message: format!(
                    "{}: expected <project> root element, found <{}>",
                    file.display(),
                    doc.root.name
                ),
            }
            .into());
        }
        Ok(Self { file, doc })
    }

    /// A new, minimal manifest at `file`: model version, coordinates and
    /// packaging. `version` may be left out when a parent will supply it.
    pub fn new_project(
        file: impl Into<PathBuf>,
        group_id: &str,
        artifact_id: &str,
        version: Option<&str>,
        packaging: &str,
    ) -> miette::Result<Self> {
        let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
                   <project xmlns=\"http://maven.apache.org/POM/4.0.0\" \
                   xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" \
                   xsi:schemaLocation=\"http://maven.apache.org/POM/4.0.0 http://maven.apache.org/maven-v4_0_0.xsd\">\n  \
                   <modelVersion>4.0.0</modelVersion>\n</project>\n";
        let mut pom = Self::parse(file, xml)?;
        let indent = pom.doc.indent.clone();
        let root = &mut pom.doc.root;
        root.append_child(Element::with_text("groupId", group_id), 0, &indent);
        root.append_child(Element::with_text("artifactId", artifact_id), 0, &indent);
        if let Some(version) = version {
            root.append_child(Element::with_text("version", version), 0, &indent);
        }
        root.append_child(Element::with_text("packaging", packaging), 0, &indent);
        Ok(pom)
    }

    /// A fresh `pom`-packaged aggregator manifest for `dir`.
    ///
    /// When `parent` is given the new manifest inherits its version through a
    /// `<parent>` reference at `relative_path`.
    pub fn new_aggregator(
        dir: &Path,
        group_id: &str,
        artifact_id: &str,
        parent: Option<(&PomDocument, &str)>,
    ) -> miette::Result<Self> {
        let version = parent.is_none().then_some("1.0-SNAPSHOT");
        let mut pom = Self::new_project(dir.join(POM_FILE), group_id, artifact_id, version, "pom")?;
        let indent = pom.doc.indent.clone();
        let name = format!("{} (aggregator)", compound_id(group_id, artifact_id));
        pom.doc
            .root
            .append_child(Element::with_text("name", &name), 0, &indent);
        pom.doc.root.append_child(Element::new("modules"), 0, &indent);
        if let Some((parent, relative_path)) = parent {
            pom.set_parent(parent, relative_path, true);
        }
        Ok(pom)
    }

    /// Persist the manifest to its file.
    pub fn write(&self) -> miette::Result<()> {
        std::fs::write(&self.file, self.doc.to_xml()).map_err(|e| {
            PaxError::Manifest {
                message: format!("Failed to write {}: {e}", self.file.display()),
            }
            .into()
        })
    }

    pub fn to_xml(&self) -> String {
        self.doc.to_xml()
    }

    /// Parse the current content into the read-only [`Pom`] model.
    pub fn to_pom(&self) -> miette::Result<Pom> {
        pom::parse_pom(&self.doc.to_xml())
    }

    /// Path of the `pom.xml` file.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Directory holding the manifest.
    pub fn base_dir(&self) -> &Path {
        self.file.parent().unwrap_or_else(|| Path::new("."))
    }

    fn parent_element(&self) -> Option<&Element> {
        self.doc.root.child("parent")
    }

    pub fn group_id(&self) -> Option<String> {
        self.doc
            .root
            .child_text("groupId")
            .or_else(|| self.parent_element().and_then(|p| p.child_text("groupId")))
    }

    pub fn artifact_id(&self) -> Option<String> {
        self.doc.root.child_text("artifactId")
    }

    pub fn version(&self) -> Option<String> {
        self.doc
            .root
            .child_text("version")
            .or_else(|| self.parent_element().and_then(|p| p.child_text("version")))
    }

    pub fn packaging(&self) -> String {
        self.doc
            .root
            .child_text("packaging")
            .unwrap_or_else(|| "jar".to_string())
    }

    pub fn name(&self) -> Option<String> {
        self.doc.root.child_text("name")
    }

    /// `(group, artifact, version)` identity of this module; missing parts are empty.
    pub fn identity(&self) -> Coordinate {
        Coordinate::new(
            self.group_id().unwrap_or_default(),
            self.artifact_id().unwrap_or_default(),
            self.version().unwrap_or_default(),
        )
        .with_type(self.packaging())
    }

    /// `group:artifact:version` for log messages.
    pub fn id(&self) -> String {
        self.identity().key()
    }

    /// Whether the packaging carries OSGi bundle markers.
    pub fn is_bundle_manifest(&self) -> bool {
        if self.packaging() == "bundle" {
            return true;
        }
        self.doc
            .root
            .child("build")
            .and_then(|b| b.child("plugins"))
            .is_some_and(|plugins| {
                plugins
                    .children_named("plugin")
                    .any(|p| p.child_text("artifactId").as_deref() == Some("maven-bundle-plugin"))
            })
    }

    // ---- modules -------------------------------------------------------

    pub fn modules(&self) -> Vec<String> {
        self.doc
            .root
            .child("modules")
            .map(|m| m.children_named("module").map(Element::text).collect())
            .unwrap_or_default()
    }

    pub fn has_module(&self, name: &str) -> bool {
        self.modules().iter().any(|m| module_matches(m, name))
    }

    /// Add `name` to the module list. Returns `true` if the manifest changed.
    pub fn add_module(&mut self, name: &str, overwrite: bool) -> bool {
        let indent = self.doc.indent.clone();
        if self.doc.root.child("modules").is_none() {
            self.doc.root.insert_child_after(
                Element::new("modules"),
                &["properties", "description", "name", "packaging", "version", "artifactId"],
                0,
                &indent,
            );
        }
        let Some(modules) = self.doc.root.child_mut("modules") else {
            return false;
        };
        match modules.position(|e| e.name == "module" && module_matches(&e.text(), name)) {
            Some(_) if !overwrite => false,
            Some(index) => {
                modules.replace_child(index, Element::with_text("module", name), 1, &indent);
                true
            }
            None => {
                modules.append_child(Element::with_text("module", name), 1, &indent);
                true
            }
        }
    }

    /// Remove `name` from the module list. Returns `true` if it was listed.
    pub fn remove_module(&mut self, name: &str) -> bool {
        match self.doc.root.child_mut("modules") {
            Some(modules) => {
                modules.remove_children(|e| e.name == "module" && module_matches(&e.text(), name))
                    > 0
            }
            None => false,
        }
    }

    // ---- dependencies --------------------------------------------------

    pub fn dependencies(&self) -> Vec<ManifestDependency> {
        self.doc
            .root
            .child("dependencies")
            .map(|deps| {
                deps.children_named("dependency")
                    .map(|d| ManifestDependency {
                        group_id: d.child_text("groupId").unwrap_or_default(),
                        artifact_id: d.child_text("artifactId").unwrap_or_default(),
                        version: d.child_text("version"),
                        type_: d.child_text("type").unwrap_or_else(|| "jar".to_string()),
                        scope: d.child_text("scope"),
                        optional: d.child_text("optional").as_deref() == Some("true"),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Record `edge` in the dependency list.
    ///
    /// An existing entry with the same `groupId:artifactId:type` is left
    /// alone unless `overwrite` is set, in which case it is replaced where it
    /// stands.
    pub fn add_dependency(&mut self, edge: &DependencyEdge, overwrite: bool) -> RecordOutcome {
        let indent = self.doc.indent.clone();
        if self.doc.root.child("dependencies").is_none() {
            self.doc.root.append_child(Element::new("dependencies"), 0, &indent);
        }
        let Some(deps) = self.doc.root.child_mut("dependencies") else {
            return RecordOutcome::Skipped;
        };
        let target = &edge.target;
        let existing = deps.position(|d| {
            d.name == "dependency"
                && d.child_text("groupId").as_deref() == Some(target.group_id.as_str())
                && d.child_text("artifactId").as_deref() == Some(target.artifact_id.as_str())
                && d.child_text("type").as_deref().unwrap_or("jar") == target.type_
        });
        let element = dependency_element(edge);
        match existing {
            Some(_) if !overwrite => RecordOutcome::Skipped,
            Some(index) => {
                deps.replace_child(index, element, 1, &indent);
                RecordOutcome::Replaced
            }
            None => {
                deps.append_child(element, 1, &indent);
                RecordOutcome::Added
            }
        }
    }

    /// Remove every dependency on `group_id:artifact_id`. Returns `true` if any was removed.
    pub fn remove_dependency(&mut self, group_id: &str, artifact_id: &str) -> bool {
        match self.doc.root.child_mut("dependencies") {
            Some(deps) => {
                deps.remove_children(|d| {
                    d.name == "dependency"
                        && d.child_text("groupId").as_deref() == Some(group_id)
                        && d.child_text("artifactId").as_deref() == Some(artifact_id)
                }) > 0
            }
            None => false,
        }
    }

    // ---- parent --------------------------------------------------------

    pub fn parent(&self) -> Option<ParentRef> {
        self.parent_element().map(|p| ParentRef {
            group_id: p.child_text("groupId").unwrap_or_default(),
            artifact_id: p.child_text("artifactId").unwrap_or_default(),
            version: p.child_text("version").unwrap_or_default(),
            relative_path: p.child_text("relativePath"),
        })
    }

    /// Effective relative path to the parent manifest, or `None` without a parent.
    pub fn relative_path(&self) -> Option<String> {
        self.parent().map(|p| {
            p.relative_path
                .unwrap_or_else(|| DEFAULT_RELATIVE_PATH.to_string())
        })
    }

    /// Point `<parent>` at `parent`. Returns `true` if the manifest changed.
    pub fn set_parent(&mut self, parent: &PomDocument, relative_path: &str, overwrite: bool) -> bool {
        if self.parent_element().is_some() && !overwrite {
            return false;
        }
        let element = Element::new("parent")
            .child_element(Element::with_text(
                "groupId",
                &parent.group_id().unwrap_or_default(),
            ))
            .child_element(Element::with_text(
                "artifactId",
                &parent.artifact_id().unwrap_or_default(),
            ))
            .child_element(Element::with_text(
                "version",
                &parent.version().unwrap_or_default(),
            ))
            .child_element(Element::with_text("relativePath", relative_path));

        let indent = self.doc.indent.clone();
        let root = &mut self.doc.root;
        match root.position(|e| e.name == "parent") {
            Some(index) => root.replace_child(index, element, 0, &indent),
            None => root.insert_child_after(element, &["modelVersion"], 0, &indent),
        }
        true
    }

    /// Add (`offset > 0`) or strip (`offset < 0`) leading `../` steps on the
    /// parent's relative path. Returns `true` if the manifest changed.
    pub fn adjust_relative_path(&mut self, offset: isize) -> bool {
        if offset == 0 {
            return false;
        }
        let Some(current) = self.relative_path() else {
            return false;
        };
        let adjusted = offset_relative_path(&current, offset);
        if adjusted == current && self.parent().and_then(|p| p.relative_path).is_some() {
            return false;
        }
        let indent = self.doc.indent.clone();
        let Some(parent) = self.doc.root.child_mut("parent") else {
            return false;
        };
        parent.set_child_text("relativePath", &adjusted, 1, &indent);
        true
    }

    /// Dependencies of this module as typed edges, for bookkeeping that
    /// needs scopes. Unversioned entries are skipped.
    pub fn dependency_edges(&self) -> miette::Result<Vec<DependencyEdge>> {
        let mut edges = Vec::new();
        for dep in self.dependencies() {
            let Some(version) = dep.version else {
                tracing::debug!(
                    "skipping unversioned {}:{} in {}",
                    dep.group_id,
                    dep.artifact_id,
                    self.file.display()
                );
                continue;
            };
            let scope = Scope::from_pom(dep.scope.as_deref())?;
            let target =
                Coordinate::new(dep.group_id, dep.artifact_id, version).with_type(dep.type_);
            edges.push(DependencyEdge::new(target, scope).optional(dep.optional));
        }
        Ok(edges)
    }
}

impl fmt::Display for PomDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

/// Module entries may carry a trailing slash or `./` prefix.
fn module_matches(entry: &str, name: &str) -> bool {
    let clean = |s: &str| {
        s.trim()
            .trim_start_matches("./")
            .trim_end_matches('/')
            .to_string()
    };
    clean(entry) == clean(name)
}

fn dependency_element(edge: &DependencyEdge) -> Element {
    let target = &edge.target;
    let mut element = Element::new("dependency")
        .child_element(Element::with_text("groupId", &target.group_id))
        .child_element(Element::with_text("artifactId", &target.artifact_id))
        .child_element(Element::with_text("version", &target.version));
    if target.type_ != "jar" {
        element = element.child_element(Element::with_text("type", &target.type_));
    }
    if edge.scope != Scope::Compile {
        element = element.child_element(Element::with_text("scope", edge.scope.as_str()));
    }
    if edge.optional {
        element = element.child_element(Element::with_text("optional", "true"));
    }
    element
}

/// Apply a signed `../` offset to a slash-separated relative path.
pub fn offset_relative_path(path: &str, offset: isize) -> String {
    if offset >= 0 {
        return format!("{}{}", "../".repeat(offset as usize), path);
    }
    let mut rest = path;
    for _ in 0..offset.unsigned_abs() {
        match rest.strip_prefix("../") {
            Some(stripped) => rest = stripped,
            None if rest == ".." => rest = "",
            None => break,
        }
    }
    if rest.is_empty() {
        ".".to_string()
    } else {
        rest.to_string()
    }
}
