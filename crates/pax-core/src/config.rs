use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::DEFAULT_PROVISION_ID;

/// Maven Central base URL, used when no repository is configured.
pub const MAVEN_CENTRAL_URL: &str = "https://repo.maven.apache.org/maven2";

/// Global user configuration loaded from `~/.pax/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Local Maven repository; defaults to `~/.m2/repository`.
    #[serde(default, rename = "local-repository")]
    pub local_repository: Option<String>,

    /// Remote repositories by name.
    #[serde(default)]
    pub repositories: BTreeMap<String, String>,

    #[serde(default)]
    pub credentials: BTreeMap<String, CredentialEntry>,

    #[serde(default)]
    pub provision: ProvisionConfig,
}

/// Credential entry for a named repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialEntry {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Provisioning settings from `[provision]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionConfig {
    /// OSGi framework the runner deploys onto.
    #[serde(default = "default_framework")]
    pub framework: String,
    /// Runner version; selects the command-line dialect.
    #[serde(default = "default_runner")]
    pub runner: String,
    /// Executable spawned to deploy the provisioned bundles.
    #[serde(default = "default_runner_command", rename = "runner-command")]
    pub runner_command: String,
    /// Module name of the shared provisioning manifest.
    #[serde(default = "default_provision_id", rename = "provision-id")]
    pub provision_id: String,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            framework: default_framework(),
            runner: default_runner(),
            runner_command: default_runner_command(),
            provision_id: default_provision_id(),
        }
    }
}

fn default_framework() -> String {
    "felix".to_string()
}

fn default_runner() -> String {
    "0.5.0".to_string()
}

fn default_runner_command() -> String {
    "pax-runner".to_string()
}

fn default_provision_id() -> String {
    DEFAULT_PROVISION_ID.to_string()
}

impl GlobalConfig {
    /// Load the global configuration from `~/.pax/config.toml`, or return defaults if the file doesn't exist.
    pub fn load() -> miette::Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load configuration from an explicit path; a missing file yields defaults.
    pub fn load_from(path: &Path) -> miette::Result<Self> {
        if !path.is_file() {
            tracing::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| pax_util::errors::PaxError::Config {
                message: format!("Failed to read {}: {e}", path.display()),
            })?;
        toml::from_str(&content).map_err(|e| {
            pax_util::errors::PaxError::Config {
                message: format!("Failed to parse {}: {e}", path.display()),
            }
            .into()
        })
    }

    /// Returns the default path to the global config file.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// Local repository directory, with `~` expanded.
    pub fn local_repository_path(&self) -> PathBuf {
        match self.local_repository {
            Some(ref path) => expand_home(path),
            None => home_dir().join(".m2").join("repository"),
        }
    }

    /// Configured remote repositories, falling back to Maven Central.
    pub fn remote_repositories(&self) -> Vec<(String, String)> {
        if self.repositories.is_empty() {
            return vec![("central".to_string(), MAVEN_CENTRAL_URL.to_string())];
        }
        self.repositories
            .iter()
            .map(|(name, url)| (name.clone(), url.clone()))
            .collect()
    }
}

fn home_dir() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => home_dir().join(rest),
        None => PathBuf::from(path),
    }
}

/// Returns the pax data directory: `$PAX_HOME`, or `~/.pax/`.
pub fn dirs_path() -> PathBuf {
    match std::env::var("PAX_HOME") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => home_dir().join(".pax"),
    }
}
