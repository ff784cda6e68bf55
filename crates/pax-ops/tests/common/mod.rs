#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub fn write(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

pub fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

fn child_pom(parent: &str, artifact: &str, packaging: &str, extra: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<project>
  <modelVersion>4.0.0</modelVersion>
  <parent>
    <groupId>org.example</groupId>
    <artifactId>{parent}</artifactId>
    <version>1.0-SNAPSHOT</version>
    <relativePath>../pom.xml</relativePath>
  </parent>
  <artifactId>{artifact}</artifactId>
  <packaging>{packaging}</packaging>
{extra}</project>
"#
    )
}

/// A small project:
///
/// ```text
/// app/                 pom, modules: provision, bundles
///   provision/         pom, depends on foo (provided)
///   bundles/           pom, modules: foo
///     foo/             bundle
/// ```
pub struct Fixture {
    pub tmp: tempfile::TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let fixture = Self { tmp };
        let root = fixture.root();
        write(
            &root.join("pom.xml"),
            r#"<?xml version="1.0" encoding="UTF-8"?>
<project>
  <modelVersion>4.0.0</modelVersion>
  <groupId>org.example</groupId>
  <artifactId>app</artifactId>
  <version>1.0-SNAPSHOT</version>
  <packaging>pom</packaging>
  <modules>
    <module>provision</module>
    <module>bundles</module>
  </modules>
</project>
"#,
        );
        write(
            &root.join("provision/pom.xml"),
            &child_pom(
                "app",
                "provision",
                "pom",
                r#"  <dependencies>
    <dependency>
      <groupId>org.example</groupId>
      <artifactId>foo</artifactId>
      <version>1.0-SNAPSHOT</version>
      <scope>provided</scope>
    </dependency>
  </dependencies>
"#,
            ),
        );
        write(
            &root.join("bundles/pom.xml"),
            &child_pom(
                "app",
                "bundles",
                "pom",
                "  <modules>\n    <module>foo</module>\n  </modules>\n",
            ),
        );
        write(
            &root.join("bundles/foo/pom.xml"),
            &child_pom("bundles", "foo", "bundle", ""),
        );
        fixture
    }

    /// Canonical project root, so comparisons survive symlinked temp dirs.
    pub fn root(&self) -> PathBuf {
        let root = self.tmp.path().join("app");
        std::fs::create_dir_all(&root).unwrap();
        root.canonicalize().unwrap()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    pub fn pom(&self, rel: &str) -> String {
        read(&self.path(rel).join("pom.xml"))
    }
}
