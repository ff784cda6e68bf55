//! Where resolved modules come from.
//!
//! [`ArtifactSource`] is the seam the graph resolver walks through;
//! [`RepositorySource`] is the real implementation over the local repository
//! and the configured remotes.

use std::path::PathBuf;

use reqwest::blocking::Client;

use pax_core::config::GlobalConfig;
use pax_core::coordinate::{Coordinate, DependencyEdge};
use pax_core::scope::Scope;
use pax_util::errors::PaxError;

use crate::cache::LocalRepository;
use crate::pom::{self, Pom};
use crate::repository::MavenRepository;
use crate::{checksum, download};

/// Parent chains deeper than this are treated as cycles.
const MAX_PARENT_DEPTH: usize = 16;

/// A module description as the resolver needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModule {
    pub coordinate: Coordinate,
    /// Declared packaging, `jar` when undeclared.
    pub packaging: String,
    /// `<name>`, or the artifactId.
    pub name: String,
    pub dependencies: Vec<DependencyEdge>,
}

impl ResolvedModule {
    /// Aggregator modules are never imported themselves.
    pub fn is_aggregator(&self) -> bool {
        self.packaging == "pom"
    }
}

/// Resolves coordinates to module descriptions and artifact files.
pub trait ArtifactSource {
    fn resolve_module(&self, coordinate: &Coordinate) -> miette::Result<ResolvedModule>;

    /// Local path of the module's main artifact, fetching it if needed.
    fn artifact_file(&self, coordinate: &Coordinate) -> miette::Result<PathBuf>;
}

/// Local repository first, then each remote in configuration order.
pub struct RepositorySource {
    local: LocalRepository,
    remotes: Vec<MavenRepository>,
    client: Option<Client>,
}

impl RepositorySource {
    pub fn new(local: LocalRepository, remotes: Vec<MavenRepository>) -> miette::Result<Self> {
        let client = if remotes.is_empty() {
            None
        } else {
            Some(download::build_client()?)
        };
        Ok(Self {
            local,
            remotes,
            client,
        })
    }

    pub fn from_config(config: &GlobalConfig) -> miette::Result<Self> {
        Self::new(
            LocalRepository::new(config.local_repository_path()),
            MavenRepository::from_config(config),
        )
    }

    /// Only what is already in the local repository.
    pub fn offline(local: LocalRepository) -> Self {
        Self {
            local,
            remotes: Vec::new(),
            client: None,
        }
    }

    pub fn local(&self) -> &LocalRepository {
        &self.local
    }

    /// Try each remote for `url_of(repo)`, verifying and caching what is found.
    fn fetch_remote(
        &self,
        coordinate: &Coordinate,
        url_of: impl Fn(&MavenRepository) -> String,
    ) -> miette::Result<Option<Vec<u8>>> {
        let Some(client) = self.client.as_ref() else {
            return Ok(None);
        };
        let mut last_err = None;
        for repo in &self.remotes {
            let url = url_of(repo);
            tracing::debug!("fetching {url}");
            match download::download_bytes(client, repo, &url) {
                Ok(Some(data)) => {
                    checksum::verify(client, repo, &url, &data)?;
                    return Ok(Some(data));
                }
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!("{} unavailable from {}: {e}", coordinate, repo.name);
                    last_err = Some(e);
                }
            }
        }
        match last_err {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }

    fn fetch_pom(&self, coordinate: &Coordinate) -> miette::Result<Pom> {
        if let Some(pom) = self.local.get_pom(coordinate) {
            return Ok(pom);
        }
        let Some(data) = self.fetch_remote(coordinate, |repo| repo.pom_url(coordinate))? else {
            return Err(PaxError::Resolution {
                message: format!("No POM found for {coordinate}"),
            }
            .into());
        };
        let xml = String::from_utf8_lossy(&data);
        let pom = pom::parse_pom(&xml)?;
        self.local.put_pom(coordinate, &xml)?;
        Ok(pom)
    }

    /// The POM with its whole parent chain merged in, not yet interpolated.
    fn merged_pom(&self, coordinate: &Coordinate, depth: usize) -> miette::Result<Pom> {
        if depth > MAX_PARENT_DEPTH {
            return Err(PaxError::Resolution {
                message: format!("Parent chain of {coordinate} is too deep or cyclic"),
            }
            .into());
        }
        let mut pom = self.fetch_pom(coordinate)?;
        if let Some(parent) = pom.parent.clone() {
            let parent_coord = Coordinate::new(parent.group_id, parent.artifact_id, parent.version)
                .with_type("pom");
            let parent_pom = self.merged_pom(&parent_coord, depth + 1)?;
            pom.apply_parent(&parent_pom);
        }
        Ok(pom)
    }
}

impl ArtifactSource for RepositorySource {
    fn resolve_module(&self, coordinate: &Coordinate) -> miette::Result<ResolvedModule> {
        let mut pom = self.merged_pom(coordinate, 0)?;
        pom.resolve_properties();
        module_from_pom(coordinate, &pom)
    }

    fn artifact_file(&self, coordinate: &Coordinate) -> miette::Result<PathBuf> {
        if let Some(path) = self.local.get_artifact(coordinate) {
            return Ok(path);
        }
        match self.fetch_remote(coordinate, |repo| repo.artifact_url(coordinate))? {
            Some(data) => self.local.put_artifact(coordinate, &data),
            None => Err(PaxError::Resolution {
                message: format!("No artifact found for {coordinate}"),
            }
            .into()),
        }
    }
}

/// Turn an effective POM into the resolver's view of the module.
///
/// Versions missing on a dependency come from dependencyManagement; entries
/// that stay unversioned are dropped.
pub fn module_from_pom(coordinate: &Coordinate, pom: &Pom) -> miette::Result<ResolvedModule> {
    let mut dependencies = Vec::with_capacity(pom.dependencies.len());
    for dep in &pom.dependencies {
        let managed = pom.managed(&dep.group_id, &dep.artifact_id);
        let version = dep
            .version
            .clone()
            .or_else(|| managed.and_then(|m| m.version.clone()));
        let Some(version) = version else {
            tracing::debug!(
                "{coordinate}: skipping {}:{} without a version",
                dep.group_id,
                dep.artifact_id
            );
            continue;
        };
        let scope = dep
            .scope
            .as_deref()
            .or_else(|| managed.and_then(|m| m.scope.as_deref()));
        let scope = Scope::from_pom(scope)?;
        let type_ = dep.type_.clone().unwrap_or_else(|| "jar".to_string());
        let target = Coordinate::new(&dep.group_id, &dep.artifact_id, version)
            .with_type(type_)
            .meta();
        dependencies.push(DependencyEdge::new(target, scope).optional(dep.optional));
    }

    let packaging = pom.effective_packaging().to_string();
    Ok(ResolvedModule {
        coordinate: coordinate.clone(),
        name: pom.display_name(),
        packaging,
        dependencies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_with(poms: &[(&Coordinate, &str)]) -> (tempfile::TempDir, RepositorySource) {
        let tmp = tempfile::tempdir().unwrap();
        let local = LocalRepository::new(tmp.path());
        for (coord, xml) in poms {
            local.put_pom(coord, xml).unwrap();
        }
        (tmp, RepositorySource::offline(local))
    }

    #[test]
    fn edges_carry_scope_and_managed_versions() {
        let parent = Coordinate::new("org.example", "parent", "1").with_type("pom");
        let child = Coordinate::new("org.example", "child", "1.0");
        let (_tmp, source) = source_with(&[
            (
                &parent,
                r#"<project>
  <groupId>org.example</groupId><artifactId>parent</artifactId><version>1</version>
  <packaging>pom</packaging>
  <properties><fw.version>2.0</fw.version></properties>
  <dependencyManagement><dependencies>
    <dependency><groupId>org.example</groupId><artifactId>fw</artifactId><version>${fw.version}</version><scope>provided</scope></dependency>
  </dependencies></dependencyManagement>
</project>"#,
            ),
            (
                &child,
                r#"<project>
  <parent><groupId>org.example</groupId><artifactId>parent</artifactId><version>1</version></parent>
  <artifactId>child</artifactId><version>1.0</version>
  <packaging>bundle</packaging>
  <dependencies>
    <dependency><groupId>org.example</groupId><artifactId>fw</artifactId></dependency>
    <dependency><groupId>org.example</groupId><artifactId>nover</artifactId></dependency>
    <dependency><groupId>org.example</groupId><artifactId>opt</artifactId><version>1.0-20070810.123456-7</version><optional>true</optional></dependency>
  </dependencies>
</project>"#,
            ),
        ]);

        let module = source.resolve_module(&child).unwrap();
        assert_eq!(module.packaging, "bundle");
        assert_eq!(module.name, "child");
        assert_eq!(module.dependencies.len(), 2);

        let fw = &module.dependencies[0];
        assert_eq!(fw.target.key(), "org.example:fw:2.0");
        assert_eq!(fw.scope, Scope::Provided);

        let opt = &module.dependencies[1];
        assert_eq!(opt.target.version, "1.0-SNAPSHOT");
        assert!(opt.optional);
    }

    #[test]
    fn missing_pom_offline_is_resolution_error() {
        let (_tmp, source) = source_with(&[]);
        let err = source
            .resolve_module(&Coordinate::new("org.none", "gone", "1"))
            .unwrap_err();
        assert!(err.to_string().contains("No POM found"));
    }

    #[test]
    fn unknown_scope_is_rejected() {
        let coord = Coordinate::new("org.example", "bad", "1");
        let (_tmp, source) = source_with(&[(
            &coord,
            r#"<project><groupId>org.example</groupId><artifactId>bad</artifactId><version>1</version>
<dependencies><dependency><groupId>x</groupId><artifactId>y</artifactId><version>1</version><scope>Provided</scope></dependency></dependencies>
</project>"#,
        )]);
        assert!(source.resolve_module(&coord).is_err());
    }
}
