//! Local Maven repository (`~/.m2/repository` layout).
//!
//! Downloads are cached here and the provisioning deployment POM is
//! installed here so the runner can pick it up by coordinates.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use pax_core::coordinate::Coordinate;
use pax_util::errors::PaxError;

use crate::pom::{self, Pom};
use crate::repository::{artifact_extension, MavenRepository};

#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
}

impl LocalRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every file of one coordinate.
    pub fn artifact_dir(&self, coordinate: &Coordinate) -> PathBuf {
        self.root.join(MavenRepository::coordinate_path(
            &coordinate.group_id,
            &coordinate.artifact_id,
            &coordinate.version,
        ))
    }

    pub fn pom_path(&self, coordinate: &Coordinate) -> PathBuf {
        self.artifact_dir(coordinate)
            .join(MavenRepository::file_name(coordinate, "pom"))
    }

    pub fn artifact_path(&self, coordinate: &Coordinate) -> PathBuf {
        self.artifact_dir(coordinate).join(MavenRepository::file_name(
            coordinate,
            &artifact_extension(&coordinate.type_),
        ))
    }

    /// Cached POM text, if present.
    pub fn get_pom_text(&self, coordinate: &Coordinate) -> Option<String> {
        fs::read_to_string(self.pom_path(coordinate)).ok()
    }

    /// Cached and parsed POM. A file that no longer parses counts as a miss.
    pub fn get_pom(&self, coordinate: &Coordinate) -> Option<Pom> {
        let content = self.get_pom_text(coordinate)?;
        match pom::parse_pom(&content) {
            Ok(pom) => Some(pom),
            Err(e) => {
                tracing::warn!("ignoring unreadable {}: {e}", self.pom_path(coordinate).display());
                None
            }
        }
    }

    /// Cached artifact file, if present.
    pub fn get_artifact(&self, coordinate: &Coordinate) -> Option<PathBuf> {
        let path = self.artifact_path(coordinate);
        path.is_file().then_some(path)
    }

    /// Write `data` to `path` through a temp file in the same directory, so
    /// concurrent readers never see a half-written artifact.
    fn put(&self, path: &Path, data: &[u8]) -> miette::Result<PathBuf> {
        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir).map_err(PaxError::Io)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(PaxError::Io)?;
        tmp.write_all(data).map_err(PaxError::Io)?;
        tmp.persist(path).map_err(|e| PaxError::Io(e.error))?;
        Ok(path.to_path_buf())
    }

    pub fn put_pom(&self, coordinate: &Coordinate, xml: &str) -> miette::Result<PathBuf> {
        self.put(&self.pom_path(coordinate), xml.as_bytes())
    }

    pub fn put_artifact(&self, coordinate: &Coordinate, data: &[u8]) -> miette::Result<PathBuf> {
        self.put(&self.artifact_path(coordinate), data)
    }

    /// Install a POM-only module, like `mvn install` does for aggregators.
    pub fn install_pom(&self, coordinate: &Coordinate, pom_file: &Path) -> miette::Result<PathBuf> {
        let data = fs::read(pom_file).map_err(|e| PaxError::Manifest {
            message: format!("Failed to read {}: {e}", pom_file.display()),
        })?;
        let installed = self.put(&self.pom_path(coordinate), &data)?;
        tracing::info!("installed {coordinate} to {}", installed.display());
        Ok(installed)
    }
}
