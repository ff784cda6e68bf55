//! Operation: collect the project's bundles into a deployment POM and hand
//! it to the provisioning runner.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use pax_core::coordinate::{compound_id, meta_version, Coordinate, DependencyEdge};
use pax_core::scope::Scope;
use pax_maven::cache::LocalRepository;
use pax_maven::document::{PomDocument, POM_FILE};
use pax_util::errors::PaxError;
use pax_util::process::CommandBuilder;

use crate::project_tree::{ModuleNode, ProjectTree};

/// First runner release that takes a deployment POM path instead of coordinates.
const MODERN_RUNNER: semver::Version = semver::Version::new(0, 5, 0);

/// Launches the provisioning runner with a prepared argument list.
pub trait Runner {
    fn run(&self, args: &[String]) -> miette::Result<()>;
}

/// Spawns the configured runner executable.
pub struct ExternalRunner {
    command: String,
    cwd: Option<PathBuf>,
}

impl ExternalRunner {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            cwd: None,
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

impl Runner for ExternalRunner {
    fn run(&self, args: &[String]) -> miette::Result<()> {
        let mut cmd = CommandBuilder::new(&self.command).args(args.iter().cloned());
        if let Some(ref dir) = self.cwd {
            cmd = cmd.cwd(dir.to_string_lossy());
        }
        tracing::info!("running {}", cmd.display());
        let status = cmd.status()?;
        if status.success() {
            Ok(())
        } else {
            Err(PaxError::Process {
                message: format!("{} exited with {status}", self.command),
            }
            .into())
        }
    }
}

/// Command-line flavour understood by a runner release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerDialect {
    /// Coordinates plus repository list, before 0.5.0.
    Classic,
    /// Path to the deployment POM.
    Modern,
}

impl RunnerDialect {
    /// Pick the dialect for a runner version such as `0.4` or `0.7.2`.
    /// Snapshots count as their release; unparseable versions get the
    /// modern dialect.
    pub fn for_version(version: &str) -> Self {
        match lenient_version(version) {
            Some(mut v) => {
                v.pre = semver::Prerelease::EMPTY;
                if v < MODERN_RUNNER {
                    RunnerDialect::Classic
                } else {
                    RunnerDialect::Modern
                }
            }
            None => {
                tracing::warn!("cannot parse runner version '{version}', assuming {MODERN_RUNNER} or later");
                RunnerDialect::Modern
            }
        }
    }
}

/// Parse `major[.minor[.patch]][-qualifier]`, padding missing parts with zero.
fn lenient_version(version: &str) -> Option<semver::Version> {
    if let Ok(v) = semver::Version::parse(version) {
        return Some(v);
    }
    let (numbers, qualifier) = match version.split_once('-') {
        Some((n, q)) => (n, Some(q)),
        None => (version, None),
    };
    let mut parts = numbers.split('.').map(|p| p.parse::<u64>().ok());
    let major = parts.next().flatten()?;
    let minor = parts.next().flatten().unwrap_or(0);
    let patch = parts.next().flatten().unwrap_or(0);
    let mut v = semver::Version::new(major, minor, patch);
    if let Some(q) = qualifier {
        v.pre = semver::Prerelease::new(q).ok()?;
    }
    Some(v)
}

/// Everything `finish` needs besides the collected bundles.
pub struct ProvisionSettings<'a> {
    pub framework: String,
    pub deploy: bool,
    pub runner_version: String,
    pub local_repository: LocalRepository,
    /// Remote repository URLs, passed to classic runners.
    pub remote_urls: Vec<String>,
    pub runner: &'a dyn Runner,
}

#[derive(Debug, Clone)]
pub struct ProvisionOutcome {
    pub deployment_pom: PathBuf,
    pub installed: PathBuf,
    pub bundles: Vec<Coordinate>,
    /// Arguments passed to the runner, when it was invoked.
    pub runner_args: Option<Vec<String>>,
}

/// Accumulates bundles across the modules of one provisioning run.
#[derive(Debug)]
pub struct ProvisionSession {
    root: PomDocument,
    root_dir: PathBuf,
    bundles: BTreeSet<Coordinate>,
}

impl ProvisionSession {
    pub fn start(tree: &ProjectTree) -> miette::Result<Self> {
        Ok(Self {
            root: tree.root_module()?.manifest,
            root_dir: tree.root().to_path_buf(),
            bundles: BTreeSet::new(),
        })
    }

    /// Collected bundles, sorted.
    pub fn bundles(&self) -> impl Iterator<Item = &Coordinate> {
        self.bundles.iter()
    }

    /// Add the module itself when it builds a bundle, plus every
    /// non-optional provided dependency of its effective POM.
    pub fn add_project(&mut self, module: &ModuleNode) {
        let manifest = &module.manifest;
        if manifest.is_bundle_manifest() {
            let id = manifest.identity();
            self.insert(&id.group_id, &id.artifact_id, &id.version);
        }

        let pom = match module.effective_pom() {
            Ok(pom) => pom,
            Err(e) => {
                tracing::warn!("unable to read dependencies of {}: {e}", manifest.id());
                return;
            }
        };
        for dep in &pom.dependencies {
            let scope = dep.scope.as_deref().or_else(|| {
                pom.managed(&dep.group_id, &dep.artifact_id)
                    .and_then(|m| m.scope.as_deref())
            });
            if scope != Some("provided") || dep.optional {
                continue;
            }
            let version = dep
                .version
                .as_deref()
                .or_else(|| pom.managed_version(&dep.group_id, &dep.artifact_id));
            match version {
                Some(v) if !v.contains("${") => self.insert(&dep.group_id, &dep.artifact_id, v),
                _ => tracing::warn!(
                    "bad version for {}:{} in dependencies of {}",
                    dep.group_id,
                    dep.artifact_id,
                    manifest.id()
                ),
            }
        }
    }

    /// Add projects from manifests outside the tree. Missing or unreadable
    /// files are skipped with a warning.
    pub fn add_additional_poms(&mut self, paths: &[PathBuf]) {
        for path in paths {
            if !path.exists() {
                tracing::warn!("{} does not exist", path.display());
                continue;
            }
            match PomDocument::read(path) {
                Ok(manifest) => self.add_project(&ModuleNode::from_manifest(manifest)),
                Err(e) => tracing::warn!("unable to read {}: {e}", path.display()),
            }
        }
    }

    fn insert(&mut self, group_id: &str, artifact_id: &str, version: &str) {
        if group_id.is_empty() || artifact_id.is_empty() || version.is_empty() {
            return;
        }
        self.bundles
            .insert(Coordinate::new(group_id, artifact_id, meta_version(version)));
    }

    /// Write and install the deployment POM, then run the runner if asked to.
    pub fn finish(self, settings: &ProvisionSettings<'_>) -> miette::Result<ProvisionOutcome> {
        if self.bundles.is_empty() {
            tracing::info!("no bundles found");
            pax_util::progress::status_warn("Provision", "No bundles found!");
        }

        let root_id = self.root.identity();
        let version = self.root.version().ok_or_else(|| PaxError::Manifest {
            message: format!("{} declares no version", self.root.file().display()),
        })?;
        let deployment = Coordinate::new(
            format!("{}.build", compound_id(&root_id.group_id, &root_id.artifact_id)),
            "deployment",
            version,
        )
        .with_type("pom");

        let deploy_dir = self.root_dir.join("target").join("deployment");
        std::fs::create_dir_all(&deploy_dir).map_err(PaxError::Io)?;
        let mut pom = PomDocument::new_project(
            deploy_dir.join(POM_FILE),
            &deployment.group_id,
            &deployment.artifact_id,
            Some(&deployment.version),
            "pom",
        )?;
        for bundle in &self.bundles {
            pom.add_dependency(&DependencyEdge::new(bundle.clone(), Scope::Compile), true);
        }
        pom.write()?;
        let installed = settings.local_repository.install_pom(&deployment, pom.file())?;

        let bundles: Vec<Coordinate> = self.bundles.into_iter().collect();
        if !settings.deploy {
            tracing::info!("deployment complete");
            return Ok(ProvisionOutcome {
                deployment_pom: pom.file().to_path_buf(),
                installed,
                bundles,
                runner_args: None,
            });
        }

        let args = runner_args(
            RunnerDialect::for_version(&settings.runner_version),
            &deployment,
            pom.file(),
            settings,
        )?;
        settings.runner.run(&args)?;

        Ok(ProvisionOutcome {
            deployment_pom: pom.file().to_path_buf(),
            installed,
            bundles,
            runner_args: Some(args),
        })
    }
}

fn runner_args(
    dialect: RunnerDialect,
    deployment: &Coordinate,
    pom_file: &Path,
    settings: &ProvisionSettings<'_>,
) -> miette::Result<Vec<String>> {
    match dialect {
        RunnerDialect::Classic => {
            let deploy_dir = pom_file.parent().unwrap_or(pom_file);
            let work_dir = deploy_dir.join("work");
            // stale copy from an earlier run would shadow the new POM
            let cached = work_dir.join("lib").join(format!(
                "{}_{}.pom",
                deployment.artifact_id, deployment.version
            ));
            if cached.is_file() {
                std::fs::remove_file(&cached).map_err(PaxError::Io)?;
            }
            Ok(vec![
                format!("--dir={}", work_dir.display()),
                "--no-md5".to_string(),
                format!("--platform={}", settings.framework),
                "--profile=default".to_string(),
                format!("--repository={}", settings.remote_urls.join(",")),
                format!("--localRepository={}", settings.local_repository.root().display()),
                deployment.group_id.clone(),
                deployment.artifact_id.clone(),
                deployment.version.clone(),
            ])
        }
        RunnerDialect::Modern => Ok(vec![
            "--overwrite".to_string(),
            format!("--platform={}", settings.framework),
            pom_file.display().to_string(),
        ]),
    }
}

/// Options for `pax-construct provision`.
#[derive(Debug, Clone)]
pub struct ProvisionOptions {
    pub base_directory: PathBuf,
    pub framework: String,
    pub deploy: bool,
    /// Extra manifests whose bundles are deployed too.
    pub deploy_poms: Vec<PathBuf>,
    pub runner_version: String,
    pub local_repository: PathBuf,
    pub remote_urls: Vec<String>,
}

/// Provision every module of the project containing `opts.base_directory`.
pub fn provision(opts: &ProvisionOptions, runner: &dyn Runner) -> miette::Result<ProvisionOutcome> {
    let tree = ProjectTree::discover(&opts.base_directory)?;
    let mut session = ProvisionSession::start(&tree)?;
    session.add_additional_poms(&opts.deploy_poms);
    for module in tree.modules()? {
        session.add_project(&module);
    }
    session.finish(&ProvisionSettings {
        framework: opts.framework.clone(),
        deploy: opts.deploy,
        runner_version: opts.runner_version.clone(),
        local_repository: LocalRepository::new(&opts.local_repository),
        remote_urls: opts.remote_urls.clone(),
        runner,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialect_boundary() {
        assert_eq!(RunnerDialect::for_version("0.4.10"), RunnerDialect::Classic);
        assert_eq!(RunnerDialect::for_version("0.4"), RunnerDialect::Classic);
        assert_eq!(RunnerDialect::for_version("0.5.0"), RunnerDialect::Modern);
        assert_eq!(RunnerDialect::for_version("1.0"), RunnerDialect::Modern);
        assert_eq!(RunnerDialect::for_version("0.5.0-SNAPSHOT"), RunnerDialect::Modern);
        assert_eq!(RunnerDialect::for_version("0.4.1-SNAPSHOT"), RunnerDialect::Classic);
        assert_eq!(RunnerDialect::for_version("latest"), RunnerDialect::Modern);
    }

    #[test]
    fn lenient_parse_pads_parts() {
        assert_eq!(lenient_version("2"), Some(semver::Version::new(2, 0, 0)));
        assert_eq!(lenient_version("0.7"), Some(semver::Version::new(0, 7, 0)));
        assert_eq!(lenient_version("x.1"), None);
    }
}
