//! Operation: import a bundle and its provided dependencies into the project.

use std::path::PathBuf;

use pax_core::coordinate::{Coordinate, DependencyEdge};
use pax_core::scope::Scope;
use pax_maven::bundle::BundleClassifier;
use pax_maven::document::{PomDocument, RecordOutcome, POM_FILE};
use pax_maven::source::ArtifactSource;
use pax_resolver::{ArtifactGraphResolver, ImportAction, ResolveOptions};
use pax_util::fs::{canonicalize_lenient, find_ancestor_with};

use crate::project_tree::{self, ModuleNode};

/// Options for `pax-construct import-bundle`.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub root: Coordinate,
    /// Module name of the provisioning manifest.
    pub provision_id: String,
    /// Directory of the module the import runs in.
    pub target_directory: PathBuf,
    pub resolve: ResolveOptions,
    /// Imported bundles must be deployed; otherwise they are recorded as optional.
    pub deploy: bool,
    pub overwrite: bool,
}

/// Record `dependency` in `manifest`, honouring `overwrite` for an existing entry.
pub fn record_dependency(
    manifest: &mut PomDocument,
    dependency: &DependencyEdge,
    overwrite: bool,
) -> RecordOutcome {
    manifest.add_dependency(dependency, overwrite)
}

/// Applies import actions to the provisioning manifest and the current module.
pub struct ImportPlanner {
    provision: Option<PomDocument>,
    current: Option<PomDocument>,
    deploy: bool,
    overwrite: bool,
    provision_dirty: bool,
    current_dirty: bool,
}

/// Where one import landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    pub action: ImportAction,
    /// `None` when the destination was not eligible.
    pub provision: Option<RecordOutcome>,
    pub current: Option<RecordOutcome>,
}

impl ImportPlanner {
    pub fn new(
        provision: Option<PomDocument>,
        current: Option<PomDocument>,
        deploy: bool,
        overwrite: bool,
    ) -> Self {
        Self {
            provision,
            current,
            deploy,
            overwrite,
            provision_dirty: false,
            current_dirty: false,
        }
    }

    /// The dependency entry written for an imported bundle.
    pub fn dependency_for(&self, action: &ImportAction) -> DependencyEdge {
        let target = Coordinate::new(
            &action.coordinate.group_id,
            &action.coordinate.artifact_id,
            &action.coordinate.version,
        );
        DependencyEdge::new(target, Scope::Provided).optional(!self.deploy)
    }

    /// Record one import. Each destination is checked on its own: bundles
    /// from the current module's own group stay out of the provisioning
    /// manifest, and the current module only takes dependencies when it is
    /// itself a bundle.
    pub fn apply(&mut self, action: &ImportAction) -> ImportRecord {
        let dependency = self.dependency_for(action);
        let local_group = self
            .current
            .as_ref()
            .and_then(PomDocument::group_id)
            .is_some_and(|g| g == dependency.target.group_id);

        let provision = match self.provision.as_mut() {
            Some(pom) if !local_group => {
                tracing::info!("importing {} to {}", action.name, pom.id());
                let outcome = record_dependency(pom, &dependency, self.overwrite);
                self.provision_dirty |= outcome.changed();
                Some(outcome)
            }
            _ => None,
        };

        let current = match self.current.as_mut() {
            Some(pom) if pom.is_bundle_manifest() => {
                tracing::info!("adding {} as a dependency to {}", action.name, pom.id());
                let outcome = record_dependency(pom, &dependency, self.overwrite);
                self.current_dirty |= outcome.changed();
                Some(outcome)
            }
            _ => None,
        };

        ImportRecord {
            action: action.clone(),
            provision,
            current,
        }
    }

    /// Persist the manifests that changed.
    pub fn write(&self) -> miette::Result<()> {
        if let (Some(pom), true) = (self.provision.as_ref(), self.provision_dirty) {
            pom.write()?;
        }
        if let (Some(pom), true) = (self.current.as_ref(), self.current_dirty) {
            pom.write()?;
        }
        Ok(())
    }
}

/// Summary of an import run.
#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    pub records: Vec<ImportRecord>,
    pub warnings: Vec<String>,
    pub resolved: usize,
    pub provision_manifest: Option<PathBuf>,
}

/// Resolve `opts.root` and record every bundle found.
pub fn import_bundle(
    opts: &ImportOptions,
    source: &dyn ArtifactSource,
    classifier: &dyn BundleClassifier,
) -> miette::Result<ImportSummary> {
    let provision = project_tree::find_pom(&opts.target_directory, &opts.provision_id)?
        .map(|node: ModuleNode| node.manifest);
    if provision.is_none() {
        tracing::warn!(
            "no provisioning module '{}' found; only the current module is updated",
            opts.provision_id
        );
    }
    let provision_manifest = provision.as_ref().map(|p| p.file().to_path_buf());

    let current = match find_ancestor_with(&canonicalize_lenient(&opts.target_directory), POM_FILE)
        .map(|dir| PomDocument::read(&dir))
    {
        Some(Ok(pom)) => Some(pom),
        Some(Err(e)) => {
            tracing::warn!("current module manifest is unreadable: {e}");
            None
        }
        None => {
            tracing::debug!("no manifest at or above {}", opts.target_directory.display());
            None
        }
    };

    let resolver = ArtifactGraphResolver::new(source, classifier);
    let resolution = resolver.resolve(&opts.root, &opts.resolve);

    let mut planner = ImportPlanner::new(provision, current, opts.deploy, opts.overwrite);
    let records: Vec<ImportRecord> = resolution.actions.iter().map(|a| planner.apply(a)).collect();
    planner.write()?;

    Ok(ImportSummary {
        records,
        warnings: resolution.warnings,
        resolved: resolution.resolved,
        provision_manifest,
    })
}
