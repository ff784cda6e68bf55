#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// Scratch home with an isolated config, local repository and project.
pub struct Workspace {
    pub tmp: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let ws = Self { tmp };
        let repo = ws.repo();
        write(
            &ws.home().join("config.toml"),
            &format!(
                "local-repository = \"{}\"\n\n[provision]\nrunner-command = \"pax-runner-not-installed\"\n",
                repo.display().to_string().replace('\\', "/")
            ),
        );
        ws.write_project();
        ws
    }

    pub fn home(&self) -> PathBuf {
        self.tmp.path().join("home")
    }

    pub fn repo(&self) -> PathBuf {
        self.tmp.path().join("repo")
    }

    pub fn project(&self) -> PathBuf {
        self.tmp.path().join("app")
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("pax-construct").unwrap();
        cmd.env("PAX_HOME", self.home())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .current_dir(self.project());
        cmd
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.project().join(rel)).unwrap()
    }

    /// Put a POM into the local repository.
    pub fn publish(&self, group: &str, artifact: &str, version: &str, body: &str) {
        let path = self
            .repo()
            .join(group.replace('.', "/"))
            .join(artifact)
            .join(version)
            .join(format!("{artifact}-{version}.pom"));
        write(
            &path,
            &format!(
                "<project>\n  <groupId>{group}</groupId>\n  <artifactId>{artifact}</artifactId>\n  <version>{version}</version>\n{body}</project>\n"
            ),
        );
    }

    fn write_project(&self) {
        let root = self.project();
        write(
            &root.join("pom.xml"),
            "<project>\n  <modelVersion>4.0.0</modelVersion>\n  <groupId>org.example</groupId>\n  <artifactId>app</artifactId>\n  <version>1.0</version>\n  <packaging>pom</packaging>\n  <modules>\n    <module>provision</module>\n    <module>bundles</module>\n  </modules>\n</project>\n",
        );
        write(&root.join("provision/pom.xml"), &child("app", "provision", "pom", ""));
        write(
            &root.join("bundles/pom.xml"),
            &child("app", "bundles", "pom", "  <modules>\n    <module>foo</module>\n  </modules>\n"),
        );
        write(&root.join("bundles/foo/pom.xml"), &child("bundles", "foo", "bundle", ""));
    }
}

fn child(parent: &str, artifact: &str, packaging: &str, extra: &str) -> String {
    format!(
        "<project>\n  <parent>\n    <groupId>org.example</groupId>\n    <artifactId>{parent}</artifactId>\n    <version>1.0</version>\n  </parent>\n  <artifactId>{artifact}</artifactId>\n  <packaging>{packaging}</packaging>\n{extra}</project>\n"
    )
}

pub fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}
