//! Operation: remove a bundle module and every reference to it.

use std::path::PathBuf;

use pax_util::errors::PaxError;

use crate::project_tree::{self, ProjectTree};

/// Options for `pax-construct remove-bundle`.
pub struct RemoveOptions {
    pub base_directory: PathBuf,
    /// Module directory, artifactId or symbolic name.
    pub bundle_name: String,
}

#[derive(Debug, Clone)]
pub struct RemoveSummary {
    pub removed: PathBuf,
    pub id: String,
    /// Manifests that lost a dependency or module entry.
    pub touched: Vec<PathBuf>,
}

/// Delete the bundle directory, then strip its dependency and `<module>`
/// entry from every manifest of the project.
pub fn remove_bundle(opts: &RemoveOptions) -> miette::Result<RemoveSummary> {
    let tree = ProjectTree::discover(&opts.base_directory)?;
    let bundle = project_tree::locate(&opts.base_directory, &opts.bundle_name)?;

    if bundle.directory == tree.root() {
        return Err(PaxError::SafetyViolation {
            message: format!("{} is the project root, not a bundle", opts.bundle_name),
        }
        .into());
    }
    if !bundle.manifest.modules().is_empty() {
        return Err(PaxError::SafetyViolation {
            message: format!(
                "Folder {} is not a bundle: it has modules of its own",
                opts.bundle_name
            ),
        }
        .into());
    }

    let group_id = bundle.manifest.group_id().unwrap_or_default();
    let artifact_id = bundle.manifest.artifact_id().unwrap_or_default();
    let module_name = bundle.name();
    let id = bundle.manifest.id();

    tracing::info!("removing {id} at {}", bundle.directory.display());
    std::fs::remove_dir_all(&bundle.directory).map_err(PaxError::Io)?;

    let mut touched = Vec::new();
    for mut node in tree.modules()? {
        let lost_dependency = node.manifest.remove_dependency(&group_id, &artifact_id);
        let lost_module = node.directory.as_path() == bundle.directory.parent().unwrap_or(tree.root())
            && node.manifest.remove_module(&module_name);
        if lost_dependency || lost_module {
            node.manifest.write()?;
            touched.push(node.manifest.file().to_path_buf());
        }
    }

    Ok(RemoveSummary {
        removed: bundle.directory,
        id,
        touched,
    })
}
