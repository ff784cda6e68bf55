//! Operation: move a bundle module to another directory of the project.
//!
//! The directory is renamed before any manifest is touched. A failed rename
//! leaves the project exactly as it was; a failure afterwards is reported as
//! an inconsistency the user has to reconcile.

use std::path::{Path, PathBuf};

use pax_maven::document::{PomDocument, POM_FILE};
use pax_util::errors::PaxError;

use crate::project_tree::{self, ModuleNode, ProjectTree};

/// Options for `pax-construct move-bundle`.
#[derive(Debug, Clone)]
pub struct MoveOptions {
    /// Directory the command runs from; relative names resolve against it.
    pub base_directory: PathBuf,
    /// Module directory, artifactId or symbolic name.
    pub bundle_name: String,
    /// New parent directory of the module.
    pub target_directory: PathBuf,
}

#[derive(Debug, Clone)]
pub struct MoveSummary {
    pub from: PathBuf,
    pub to: PathBuf,
    /// `../` steps added to (positive) or removed from the parent path.
    pub relative_offset: isize,
    /// Aggregator manifests written to reach the new location.
    pub created: Vec<PathBuf>,
}

pub fn move_bundle(opts: &MoveOptions) -> miette::Result<MoveSummary> {
    let bundle = project_tree::locate(&opts.base_directory, &opts.bundle_name)?;
    let tree = ProjectTree::discover(&opts.base_directory)?;

    let target_dir = if opts.target_directory.is_absolute() {
        opts.target_directory.clone()
    } else {
        opts.base_directory.join(&opts.target_directory)
    };
    let plan = tree.plan_module_tree(&target_dir)?.ok_or_else(|| PaxError::TreeBoundary {
        message: format!(
            "{} is outside of the project rooted at {}",
            target_dir.display(),
            tree.root().display()
        ),
    })?;

    let name = bundle.name();
    let old_parent = parent_of(&bundle)?;
    let new_parent = plan.target().to_path_buf();
    let destination = new_parent.join(&name);

    if bundle.directory == tree.root() {
        return Err(PaxError::MoveFailed {
            message: "The project root cannot be moved".to_string(),
        }
        .into());
    }
    if new_parent.starts_with(&bundle.directory) {
        return Err(PaxError::MoveFailed {
            message: format!(
                "Cannot move {} into its own subtree {}",
                bundle.manifest.id(),
                new_parent.display()
            ),
        }
        .into());
    }
    if destination.exists() {
        return Err(PaxError::MoveFailed {
            message: format!("{} already exists", destination.display()),
        }
        .into());
    }

    tracing::info!("moving {} to {}", bundle.manifest.id(), destination.display());
    std::fs::create_dir_all(&new_parent)
        .and_then(|()| std::fs::rename(&bundle.directory, &destination))
        .map_err(|e| PaxError::MoveFailed {
            message: format!(
                "Unable to move bundle {} to {}: {e}",
                opts.bundle_name,
                new_parent.display()
            ),
        })?;

    let bookkeeping = || -> miette::Result<(isize, Vec<PathBuf>)> {
        let created: Vec<PathBuf> = plan.created_dirs().map(Path::to_path_buf).collect();
        let new_parent_node = plan.apply()?;
        let offset = update_relative_path(&tree, &destination, &old_parent, &new_parent)?;
        transfer_module(&old_parent, new_parent_node, &name)?;
        Ok((offset, created))
    };

    let (relative_offset, created) = bookkeeping().map_err(|e| PaxError::PostMoveInconsistency {
        message: format!(
            "Moved {} to {} but could not update the manifests: {e}",
            bundle.directory.display(),
            destination.display()
        ),
    })?;

    Ok(MoveSummary {
        from: bundle.directory,
        to: destination,
        relative_offset,
        created,
    })
}

/// Physical parent directory of a module.
fn parent_of(node: &ModuleNode) -> miette::Result<PathBuf> {
    node.directory
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            PaxError::MoveFailed {
                message: format!("{} has no parent directory", node.directory.display()),
            }
            .into()
        })
}

/// Shift the moved module's `<relativePath>` by the change in depth between
/// its old and new parent directories.
fn update_relative_path(
    tree: &ProjectTree,
    module_dir: &Path,
    old_parent: &Path,
    new_parent: &Path,
) -> miette::Result<isize> {
    let Some(route) = tree.relative_path(old_parent, new_parent) else {
        return Ok(0);
    };
    let offset = route.depth_delta();
    if offset == 0 {
        return Ok(0);
    }
    let mut pom = PomDocument::read(module_dir)?;
    if pom.adjust_relative_path(offset) {
        tracing::debug!("relative path of {} shifted by {offset}", pom.id());
        pom.write()?;
    }
    Ok(offset)
}

/// Drop `name` from the old parent's module list and add it to the new one.
fn transfer_module(old_parent: &Path, new_parent: ModuleNode, name: &str) -> miette::Result<()> {
    let mut new_manifest = new_parent.manifest;
    if old_parent != new_parent.directory {
        if old_parent.join(POM_FILE).exists() {
            let mut old_manifest = PomDocument::read(old_parent)?;
            if old_manifest.remove_module(name) {
                old_manifest.write()?;
            }
        } else {
            tracing::debug!("old parent {} has no manifest", old_parent.display());
        }
    }
    if new_manifest.add_module(name, true) {
        new_manifest.write()?;
    }
    Ok(())
}
