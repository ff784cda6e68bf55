//! Remote Maven repository: URL layout and credentials.

use pax_core::config::{GlobalConfig, MAVEN_CENTRAL_URL};
use pax_core::coordinate::Coordinate;

/// A configured remote repository with optional credentials.
#[derive(Debug, Clone)]
pub struct MavenRepository {
    pub name: String,
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl MavenRepository {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.trim_end_matches('/').to_string(),
            username: None,
            password: None,
        }
    }

    pub fn maven_central() -> Self {
        Self::new("central", MAVEN_CENTRAL_URL)
    }

    /// All remote repositories from the global configuration, with the
    /// credentials registered under the same name.
    pub fn from_config(config: &GlobalConfig) -> Vec<Self> {
        config
            .remote_repositories()
            .into_iter()
            .map(|(name, url)| {
                let mut repo = Self::new(&name, &url);
                if let Some(creds) = config.credentials.get(&name) {
                    repo.username = creds.username.clone();
                    repo.password = creds.password.clone();
                }
                repo
            })
            .collect()
    }

    /// Standard Maven layout path for a coordinate.
    ///
    /// `org.ops4j.pax:pax-logging-api:1.4` becomes
    /// `org/ops4j/pax/pax-logging-api/1.4`
    pub fn coordinate_path(group: &str, artifact: &str, version: &str) -> String {
        format!("{}/{}/{}", group.replace('.', "/"), artifact, version)
    }

    /// File name of an artifact with the given extension.
    pub fn file_name(coordinate: &Coordinate, extension: &str) -> String {
        format!(
            "{}-{}.{extension}",
            coordinate.artifact_id, coordinate.version
        )
    }

    pub fn file_url(&self, coordinate: &Coordinate, extension: &str) -> String {
        format!(
            "{}/{}/{}",
            self.url,
            Self::coordinate_path(
                &coordinate.group_id,
                &coordinate.artifact_id,
                &coordinate.version
            ),
            Self::file_name(coordinate, extension)
        )
    }

    pub fn pom_url(&self, coordinate: &Coordinate) -> String {
        self.file_url(coordinate, "pom")
    }

    /// URL of the main artifact; bundles and plain jars are both `.jar` files.
    pub fn artifact_url(&self, coordinate: &Coordinate) -> String {
        self.file_url(coordinate, &artifact_extension(&coordinate.type_))
    }

    pub fn has_auth(&self) -> bool {
        self.username.is_some() || self.password.is_some()
    }
}

/// File extension used for an artifact of the given packaging type.
pub fn artifact_extension(type_: &str) -> String {
    match type_ {
        "bundle" | "maven-plugin" | "ejb" | "" => "jar".to_string(),
        other => other.to_string(),
    }
}
