use std::fmt;

use serde::{Deserialize, Serialize};

use crate::scope::Scope;
use crate::DEFAULT_TYPE;

/// Maven coordinates of a versioned module.
///
/// Equality is structural; [`Coordinate::key`] is the dedup identity, which
/// leaves out the type so the `pom` and `jar` variants of one module collapse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    #[serde(default = "default_type", rename = "type")]
    pub type_: String,
}

fn default_type() -> String {
    DEFAULT_TYPE.to_string()
}

impl Coordinate {
    /// Build a `jar` coordinate.
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
            type_: default_type(),
        }
    }

    /// Same coordinate with a different type.
    pub fn with_type(mut self, type_: impl Into<String>) -> Self {
        self.type_ = type_.into();
        self
    }

    /// Parse `"group:artifact:version"` or `"group:artifact:version:type"`.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return None;
        }
        match parts.as_slice() {
            [g, a, v] => Some(Self::new(*g, *a, *v)),
            [g, a, v, t] => Some(Self::new(*g, *a, *v).with_type(*t)),
            _ => None,
        }
    }

    /// Dedup identity: `group:artifact:version`.
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }

    /// `group:artifact`, the identity of a dependency entry inside a manifest.
    pub fn versionless_key(&self) -> String {
        format!("{}:{}", self.group_id, self.artifact_id)
    }

    /// Coordinate with a timestamped snapshot version collapsed to `-SNAPSHOT`.
    pub fn meta(&self) -> Self {
        Self {
            version: meta_version(&self.version),
            ..self.clone()
        }
    }

    /// OSGi-style symbolic name derived from group and artifact.
    pub fn symbolic_name(&self) -> String {
        compound_id(&self.group_id, &self.artifact_id)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)?;
        if self.type_ != DEFAULT_TYPE {
            write!(f, ":{}", self.type_)?;
        }
        Ok(())
    }
}

/// Collapse a timestamped snapshot (`1.0-20070810.123456-7`) to `1.0-SNAPSHOT`.
///
/// Any other version is returned unchanged.
pub fn meta_version(version: &str) -> String {
    let Some((base, build)) = version.rsplit_once('-') else {
        return version.to_string();
    };
    let Some((base, stamp)) = base.rsplit_once('-') else {
        return version.to_string();
    };
    let is_stamp = stamp.len() == 15
        && stamp.as_bytes()[8] == b'.'
        && stamp
            .bytes()
            .enumerate()
            .all(|(i, b)| i == 8 || b.is_ascii_digit());
    let is_build = !build.is_empty() && build.bytes().all(|b| b.is_ascii_digit());
    if is_stamp && is_build {
        format!("{base}-SNAPSHOT")
    } else {
        version.to_string()
    }
}

/// Combine a group and artifact into a single dotted id without repeating
/// the overlap, e.g. `org.ops4j` + `ops4j.foo` gives `org.ops4j.foo`.
pub fn compound_id(group_id: &str, artifact_id: &str) -> String {
    if artifact_id == group_id || group_id.ends_with(&format!(".{artifact_id}")) {
        return group_id.to_string();
    }
    if artifact_id.starts_with(&format!("{group_id}.")) {
        return artifact_id.to_string();
    }
    let last_segment = group_id.rsplit('.').next().unwrap_or(group_id);
    if let Some(rest) = artifact_id.strip_prefix(&format!("{last_segment}.")) {
        return format!("{group_id}.{rest}");
    }
    format!("{group_id}.{artifact_id}")
}

/// A dependency edge declared by a resolved module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    pub target: Coordinate,
    pub scope: Scope,
    pub optional: bool,
}

impl DependencyEdge {
    pub fn new(target: Coordinate, scope: Scope) -> Self {
        Self {
            target,
            scope,
            optional: false,
        }
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_timestamp_collapses() {
        assert_eq!(meta_version("1.0-20070810.123456-7"), "1.0-SNAPSHOT");
        assert_eq!(meta_version("2.1.3-20200101.000000-12"), "2.1.3-SNAPSHOT");
    }

    #[test]
    fn plain_versions_untouched() {
        assert_eq!(meta_version("1.0"), "1.0");
        assert_eq!(meta_version("1.0-SNAPSHOT"), "1.0-SNAPSHOT");
        assert_eq!(meta_version("1.0-beta-2"), "1.0-beta-2");
        assert_eq!(meta_version("3.0-rc1-7"), "3.0-rc1-7");
    }

    #[test]
    fn compound_id_overlap_rules() {
        assert_eq!(compound_id("org.ops4j", "ops4j"), "org.ops4j");
        assert_eq!(compound_id("org.ops4j", "org.ops4j.foo"), "org.ops4j.foo");
        assert_eq!(compound_id("org.ops4j", "ops4j.foo"), "org.ops4j.foo");
        assert_eq!(compound_id("org.example", "app"), "org.example.app");
        assert_eq!(compound_id("example", "example"), "example");
    }
}
