//! Read-only POM model: dependency declarations, parent inheritance, property interpolation.

use std::collections::BTreeMap;

use quick_xml::events::Event;
use quick_xml::Reader;

/// A parsed POM (Project Object Model) file.
#[derive(Debug, Clone, Default)]
pub struct Pom {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub name: Option<String>,

    pub parent: Option<ParentRef>,
    pub properties: BTreeMap<String, String>,
    pub dependencies: Vec<PomDependency>,
    pub dependency_management: Vec<PomDependency>,
    pub modules: Vec<String>,
    /// artifactIds of `<build><plugins>` entries.
    pub plugins: Vec<String>,
}

/// Reference to a parent POM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub relative_path: Option<String>,
}

/// A dependency declared in a POM file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PomDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub scope: Option<String>,
    pub optional: bool,
    pub type_: Option<String>,
}

impl Pom {
    /// Effective group ID (falls back to parent).
    pub fn effective_group_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or(self.parent.as_ref().map(|p| p.group_id.as_str()))
    }

    /// Effective version (falls back to parent).
    pub fn effective_version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or(self.parent.as_ref().map(|p| p.version.as_str()))
    }

    /// Packaging, `jar` when undeclared.
    pub fn effective_packaging(&self) -> &str {
        self.packaging.as_deref().unwrap_or("jar")
    }

    /// Human-readable name: `<name>` or the artifactId.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.artifact_id.clone())
            .unwrap_or_default()
    }

    /// Whether the build declares the OSGi bundle plugin or `bundle` packaging.
    pub fn has_bundle_markers(&self) -> bool {
        self.effective_packaging() == "bundle"
            || self.plugins.iter().any(|p| p == "maven-bundle-plugin")
    }

    /// Resolve `${property}` references in a string using POM properties
    /// and built-in project variables.
    pub fn interpolate(&self, input: &str) -> String {
        let mut result = input.to_string();
        let mut iterations = 0;
        while result.contains("${") && iterations < 20 {
            iterations += 1;
            let mut new = result.clone();
            while let Some(start) = new.find("${") {
                let Some(end) = new[start..].find('}') else {
                    break;
                };
                let key = &new[start + 2..start + end];
                let value = self.resolve_property(key);
                if let Some(val) = value {
                    new = format!("{}{}{}", &new[..start], val, &new[start + end + 1..]);
                } else {
                    break;
                }
            }
            if new == result {
                break;
            }
            result = new;
        }
        result
    }

    fn resolve_property(&self, key: &str) -> Option<String> {
        match key {
            "project.groupId" | "pom.groupId" => self.effective_group_id().map(|s| s.to_string()),
            "project.artifactId" | "pom.artifactId" => self.artifact_id.clone(),
            "project.version" | "pom.version" => self.effective_version().map(|s| s.to_string()),
            "project.packaging" | "pom.packaging" => self.packaging.clone(),
            "project.parent.groupId" => self.parent.as_ref().map(|p| p.group_id.clone()),
            "project.parent.version" => self.parent.as_ref().map(|p| p.version.clone()),
            _ => self.properties.get(key).cloned(),
        }
    }

    /// Interpolate all property references in dependencies and dependency management.
    pub fn resolve_properties(&mut self) {
        let pom_snapshot = self.clone();
        let deps = self
            .dependencies
            .iter_mut()
            .chain(self.dependency_management.iter_mut());
        for dep in deps {
            dep.group_id = pom_snapshot.interpolate(&dep.group_id);
            dep.artifact_id = pom_snapshot.interpolate(&dep.artifact_id);
            if let Some(ref v) = dep.version {
                dep.version = Some(pom_snapshot.interpolate(v));
            }
            if let Some(ref s) = dep.scope {
                dep.scope = Some(pom_snapshot.interpolate(s));
            }
        }
        if let Some(ref packaging) = self.packaging {
            self.packaging = Some(pom_snapshot.interpolate(packaging));
        }
    }

    /// Merge a parent POM's properties, dependencies and dependency management into this POM.
    pub fn apply_parent(&mut self, parent: &Pom) {
        for (k, v) in &parent.properties {
            self.properties
                .entry(k.clone())
                .or_insert_with(|| v.clone());
        }
        if self.group_id.is_none() {
            self.group_id = parent.effective_group_id().map(|s| s.to_string());
        }
        if self.version.is_none() {
            self.version = parent.effective_version().map(|s| s.to_string());
        }
        for dep in &parent.dependencies {
            let declared = self
                .dependencies
                .iter()
                .any(|d| d.group_id == dep.group_id && d.artifact_id == dep.artifact_id);
            if !declared {
                self.dependencies.push(dep.clone());
            }
        }
        for dm in &parent.dependency_management {
            let dominated = self
                .dependency_management
                .iter()
                .any(|d| d.group_id == dm.group_id && d.artifact_id == dm.artifact_id);
            if !dominated {
                self.dependency_management.push(dm.clone());
            }
        }
    }

    /// Look up a managed entry for a given group:artifact.
    pub fn managed(&self, group_id: &str, artifact_id: &str) -> Option<&PomDependency> {
        self.dependency_management
            .iter()
            .find(|d| d.group_id == group_id && d.artifact_id == artifact_id)
    }

    /// Look up a version from dependency management for a given group:artifact.
    pub fn managed_version(&self, group_id: &str, artifact_id: &str) -> Option<&str> {
        self.managed(group_id, artifact_id)
            .and_then(|d| d.version.as_deref())
    }
}

/// Parse a POM XML string into a `Pom` struct.
pub fn parse_pom(xml: &str) -> miette::Result<Pom> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut pom = Pom::default();
    let mut path: Vec<String> = Vec::new();
    let mut text_buf = String::new();

    let mut current_dep: Option<PomDependency> = None;
    let mut current_parent: Option<ParentRef> = None;
    let mut in_dep_mgmt = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                path.push(tag);
                text_buf.clear();

                match path_context(&path).as_str() {
                    "project>dependencyManagement>dependencies>dependency" => {
                        in_dep_mgmt = true;
                        current_dep = Some(empty_dependency());
                    }
                    "project>dependencies>dependency" => {
                        current_dep = Some(empty_dependency());
                    }
                    "project>parent" => {
                        current_parent = Some(ParentRef {
                            group_id: String::new(),
                            artifact_id: String::new(),
                            version: String::new(),
                            relative_path: None,
                        });
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                text_buf = e.unescape().unwrap_or_default().to_string();
            }
            Ok(Event::End(_)) => {
                let ctx = path_context(&path);
                let depth = path.len();
                let leaf = path.last().map(|s| s.as_str());

                // Properties: <project><properties><key>value</key></properties>
                if depth == 3 && path.get(1).map(|s| s.as_str()) == Some("properties") {
                    let prop_name = path.last().cloned().unwrap_or_default();
                    pom.properties.insert(prop_name, text_buf.clone());
                }

                if let Some(ref mut dep) = current_dep {
                    if ctx.ends_with(">dependency>groupId") {
                        dep.group_id = text_buf.clone();
                    } else if ctx.ends_with(">dependency>artifactId") {
                        dep.artifact_id = text_buf.clone();
                    } else if ctx.ends_with(">dependency>version") {
                        dep.version = Some(text_buf.clone());
                    } else if ctx.ends_with(">dependency>scope") {
                        dep.scope = Some(text_buf.clone());
                    } else if ctx.ends_with(">dependency>optional") {
                        dep.optional = text_buf.trim() == "true";
                    } else if ctx.ends_with(">dependency>type") {
                        dep.type_ = Some(text_buf.clone());
                    }

                    if ctx == "project>dependencies>dependency"
                        || ctx == "project>dependencyManagement>dependencies>dependency"
                    {
                        if let Some(dep) = current_dep.take() {
                            if in_dep_mgmt {
                                pom.dependency_management.push(dep);
                            } else {
                                pom.dependencies.push(dep);
                            }
                        }
                        in_dep_mgmt = false;
                    }
                }

                if let Some(ref mut parent) = current_parent {
                    match ctx.as_str() {
                        "project>parent>groupId" => parent.group_id = text_buf.clone(),
                        "project>parent>artifactId" => parent.artifact_id = text_buf.clone(),
                        "project>parent>version" => parent.version = text_buf.clone(),
                        "project>parent>relativePath" => {
                            parent.relative_path = Some(text_buf.clone())
                        }
                        "project>parent" => pom.parent = current_parent.take(),
                        _ => {}
                    }
                }

                // Top-level project fields
                if depth == 2 {
                    match leaf {
                        Some("groupId") => pom.group_id = Some(text_buf.clone()),
                        Some("artifactId") => pom.artifact_id = Some(text_buf.clone()),
                        Some("version") => pom.version = Some(text_buf.clone()),
                        Some("packaging") => pom.packaging = Some(text_buf.clone()),
                        Some("name") => pom.name = Some(text_buf.clone()),
                        _ => {}
                    }
                }

                match ctx.as_str() {
                    "project>modules>module" => pom.modules.push(text_buf.clone()),
                    "project>build>plugins>plugin>artifactId" => {
                        pom.plugins.push(text_buf.clone())
                    }
                    _ => {}
                }

                path.pop();
                text_buf.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(pax_util::errors::PaxError::Manifest {
                    message: format!("Failed to parse POM XML: {e}"),
                }
                .into());
            }
            _ => {}
        }
    }

    Ok(pom)
}

fn empty_dependency() -> PomDependency {
    PomDependency {
        group_id: String::new(),
        artifact_id: String::new(),
        version: None,
        scope: None,
        optional: false,
        type_: None,
    }
}

/// Build a context string from the current XML path for matching.
fn path_context(path: &[String]) -> String {
    path.join(">")
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLE_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
    <modelVersion>4.0.0</modelVersion>
    <groupId>org.ops4j.pax.logging</groupId>
    <artifactId>pax-logging-api</artifactId>
    <version>1.0.0</version>
    <packaging>bundle</packaging>
    <name>OPS4J Pax Logging - API</name>

    <properties>
        <osgi.version>4.0</osgi.version>
    </properties>

    <dependencies>
        <dependency>
            <groupId>org.osgi</groupId>
            <artifactId>osgi_R4_core</artifactId>
            <version>${osgi.version}</version>
            <scope>provided</scope>
            <optional>true</optional>
        </dependency>
        <dependency>
            <groupId>junit</groupId>
            <artifactId>junit</artifactId>
            <version>3.8.1</version>
            <scope>test</scope>
        </dependency>
    </dependencies>

    <build>
        <plugins>
            <plugin>
                <groupId>org.apache.felix</groupId>
                <artifactId>maven-bundle-plugin</artifactId>
            </plugin>
        </plugins>
    </build>
</project>"#;

    #[test]
    fn parse_bundle_pom() {
        let pom = parse_pom(BUNDLE_POM).unwrap();
        assert_eq!(pom.group_id.as_deref(), Some("org.ops4j.pax.logging"));
        assert_eq!(pom.artifact_id.as_deref(), Some("pax-logging-api"));
        assert_eq!(pom.effective_packaging(), "bundle");
        assert_eq!(pom.display_name(), "OPS4J Pax Logging - API");
        assert_eq!(pom.dependencies.len(), 2);
        assert!(pom.dependencies[0].optional);
        assert_eq!(pom.plugins, vec!["maven-bundle-plugin".to_string()]);
        assert!(pom.has_bundle_markers());
    }

    #[test]
    fn property_interpolation() {
        let mut pom = parse_pom(BUNDLE_POM).unwrap();
        pom.resolve_properties();
        assert_eq!(pom.dependencies[0].version.as_deref(), Some("4.0"));
    }

    #[test]
    fn packaging_defaults_to_jar() {
        let pom = parse_pom("<project><artifactId>x</artifactId></project>").unwrap();
        assert_eq!(pom.effective_packaging(), "jar");
        assert!(!pom.has_bundle_markers());
        assert_eq!(pom.display_name(), "x");
    }

    #[test]
    fn parent_inheritance() {
        let parent = parse_pom(
            r#"<project>
    <groupId>org.example</groupId>
    <artifactId>parent</artifactId>
    <version>2.0.0</version>
    <properties><fw.version>1.4</fw.version></properties>
    <dependencyManagement>
        <dependencies>
            <dependency>
                <groupId>org.example</groupId>
                <artifactId>fw</artifactId>
                <version>${fw.version}</version>
            </dependency>
        </dependencies>
    </dependencyManagement>
</project>"#,
        )
        .unwrap();
        let mut child = parse_pom(
            r#"<project>
    <parent>
        <groupId>org.example</groupId>
        <artifactId>parent</artifactId>
        <version>2.0.0</version>
        <relativePath>../poms/pom.xml</relativePath>
    </parent>
    <artifactId>child</artifactId>
    <dependencies>
        <dependency>
            <groupId>org.example</groupId>
            <artifactId>fw</artifactId>
        </dependency>
    </dependencies>
</project>"#,
        )
        .unwrap();
        assert_eq!(
            child.parent.as_ref().unwrap().relative_path.as_deref(),
            Some("../poms/pom.xml")
        );
        assert_eq!(child.effective_group_id(), Some("org.example"));

        child.apply_parent(&parent);
        child.resolve_properties();
        assert_eq!(child.version.as_deref(), Some("2.0.0"));
        assert_eq!(child.dependencies[0].version, None);
        assert_eq!(child.managed_version("org.example", "fw"), Some("1.4"));
    }

    #[test]
    fn modules_listed() {
        let pom = parse_pom(
            "<project><packaging>pom</packaging><modules><module>a</module><module>b</module></modules></project>",
        )
        .unwrap();
        assert_eq!(pom.modules, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(parse_pom("<project><artifactId>x</project>").is_err());
    }
}
