//! The project tree: modules reachable from the root manifest through
//! `<modules>` lists, and the path arithmetic that keeps them wired together.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use pax_core::coordinate::compound_id;
use pax_maven::document::{PomDocument, DEFAULT_RELATIVE_PATH, POM_FILE};
use pax_maven::pom::Pom;
use pax_util::errors::PaxError;
use pax_util::fs::{
    canonicalize_lenient, find_ancestor_with, relative_path, topmost_ancestor_with, RelativePath,
};

/// Parent chains longer than this are treated as cyclic.
const MAX_PARENT_DEPTH: usize = 16;

/// A directory holding a manifest.
#[derive(Debug, Clone)]
pub struct ModuleNode {
    pub directory: PathBuf,
    pub manifest: PomDocument,
    /// `<parent><relativePath>`, when the manifest has a parent.
    pub parent_path: Option<String>,
}

impl ModuleNode {
    pub fn read(directory: &Path) -> miette::Result<Self> {
        let directory = canonicalize_lenient(directory);
        let manifest = PomDocument::read(&directory.join(POM_FILE))?;
        let parent_path = manifest.relative_path();
        Ok(Self {
            directory,
            manifest,
            parent_path,
        })
    }

    /// Wrap a manifest read from an arbitrary file, such as an extra
    /// deployment POM.
    pub fn from_manifest(manifest: PomDocument) -> Self {
        let directory = canonicalize_lenient(manifest.base_dir());
        let parent_path = manifest.relative_path();
        Self {
            directory,
            manifest,
            parent_path,
        }
    }

    /// Directory name, which is also the `<module>` entry in the parent.
    pub fn name(&self) -> String {
        self.directory
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Directory the parent manifest lives in, following `parent_path`.
    pub fn parent_dir(&self) -> Option<PathBuf> {
        let rel = self.parent_path.as_deref()?;
        let target = self.directory.join(rel);
        let dir = if rel.ends_with(".xml") {
            target.parent()?.to_path_buf()
        } else {
            target
        };
        Some(canonicalize_lenient(&dir))
    }

    /// The module's POM merged with its on-disk parent chain, properties
    /// interpolated. The chain ends at a parent that is missing, unreadable
    /// or declares a different identity than the `<parent>` block asks for.
    pub fn effective_pom(&self) -> miette::Result<Pom> {
        let mut chain = vec![self.manifest.to_pom()?];
        let mut child = self.clone();
        while chain.len() <= MAX_PARENT_DEPTH {
            let (Some(wanted), Some(dir)) = (child.manifest.parent(), child.parent_dir()) else {
                break;
            };
            let parent = match ModuleNode::read(&dir) {
                Ok(parent) => parent,
                Err(e) => {
                    tracing::debug!("parent of {} not on disk: {e}", child.manifest.id());
                    break;
                }
            };
            let matches = parent.manifest.artifact_id().as_deref() == Some(wanted.artifact_id.as_str())
                && parent.manifest.group_id().as_deref() == Some(wanted.group_id.as_str());
            if !matches {
                tracing::debug!(
                    "{} is not the parent {}:{} of {}",
                    parent.manifest.file().display(),
                    wanted.group_id,
                    wanted.artifact_id,
                    child.manifest.id()
                );
                break;
            }
            chain.push(parent.manifest.to_pom()?);
            child = parent;
        }

        let mut merged: Option<Pom> = None;
        while let Some(mut pom) = chain.pop() {
            if let Some(ref parent) = merged {
                pom.apply_parent(parent);
            }
            merged = Some(pom);
        }
        let mut pom = merged.unwrap_or_default();
        pom.resolve_properties();
        Ok(pom)
    }

    /// Whether `name` refers to this module by artifactId, `group:artifactId`
    /// or bundle symbolic name.
    pub fn answers_to(&self, name: &str) -> bool {
        let Some(artifact_id) = self.manifest.artifact_id() else {
            return false;
        };
        if artifact_id == name {
            return true;
        }
        let group_id = self.manifest.group_id().unwrap_or_default();
        format!("{group_id}:{artifact_id}") == name || compound_id(&group_id, &artifact_id) == name
    }
}

/// Resolve `name_or_path` to a module: first as a directory (relative to
/// `base`), then by name anywhere in the project tree containing `base`.
pub fn locate(base: &Path, name_or_path: &str) -> miette::Result<ModuleNode> {
    let candidate = base.join(name_or_path);
    if candidate.join(POM_FILE).is_file() {
        return ModuleNode::read(&candidate);
    }
    let tree = ProjectTree::discover(base)?;
    let name = Path::new(name_or_path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| name_or_path.to_string());
    tree.find_module(&name)?.ok_or_else(|| {
        PaxError::NotFound {
            message: format!("Cannot find bundle {name_or_path} under {}", tree.root().display()),
        }
        .into()
    })
}

/// Convention lookup of a named module, such as the provisioning manifest.
/// Missing projects and missing modules both give `None`.
pub fn find_pom(base: &Path, name: &str) -> miette::Result<Option<ModuleNode>> {
    match ProjectTree::discover(base) {
        Ok(tree) => tree.find_module(name),
        Err(_) => Ok(None),
    }
}

/// A project rooted at the topmost directory of a contiguous chain of
/// directories that all hold a `pom.xml`.
#[derive(Debug, Clone)]
pub struct ProjectTree {
    root: PathBuf,
}

impl ProjectTree {
    /// Find the project enclosing `base`: the nearest directory with a
    /// manifest, then up through the contiguous chain of manifests.
    pub fn discover(base: &Path) -> miette::Result<Self> {
        let start = canonicalize_lenient(base);
        let root = find_ancestor_with(&start, POM_FILE)
            .and_then(|nearest| topmost_ancestor_with(&nearest, POM_FILE))
            .ok_or_else(|| PaxError::NotFound {
                message: format!("No {POM_FILE} found in {} or above", start.display()),
            })?;
        tracing::debug!("project root is {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn root_module(&self) -> miette::Result<ModuleNode> {
        ModuleNode::read(&self.root)
    }

    /// Whether `path` lies inside (or is) the project root.
    pub fn contains(&self, path: &Path) -> bool {
        canonicalize_lenient(path).starts_with(&self.root)
    }

    /// Every module reachable from the root, breadth-first, root first.
    ///
    /// Module entries pointing nowhere are skipped; so are manifests that do
    /// not parse, with a warning.
    pub fn modules(&self) -> miette::Result<Vec<ModuleNode>> {
        let mut found = Vec::new();
        self.walk(|node| {
            found.push(node.clone());
            false
        })?;
        Ok(found)
    }

    /// First module answering to `name`, in breadth-first order.
    pub fn find_module(&self, name: &str) -> miette::Result<Option<ModuleNode>> {
        let mut hit = None;
        self.walk(|node| {
            if node.answers_to(name) {
                hit = Some(node.clone());
                return true;
            }
            false
        })?;
        Ok(hit)
    }

    /// Breadth-first walk over the module lists; `visit` returns `true` to stop.
    fn walk(&self, mut visit: impl FnMut(&ModuleNode) -> bool) -> miette::Result<()> {
        let mut seen: HashSet<PathBuf> = HashSet::from([self.root.clone()]);
        let mut queue: VecDeque<PathBuf> = VecDeque::from([self.root.clone()]);

        while let Some(dir) = queue.pop_front() {
            let node = match ModuleNode::read(&dir) {
                Ok(node) => node,
                Err(e) if dir == self.root => return Err(e),
                Err(e) => {
                    tracing::warn!("skipping {}: {e}", dir.display());
                    continue;
                }
            };
            if visit(&node) {
                return Ok(());
            }
            for module in node.manifest.modules() {
                let mut child = node.directory.join(&module);
                if module.ends_with(".xml") {
                    child.pop();
                }
                let child = canonicalize_lenient(&child);
                if !child.join(POM_FILE).is_file() {
                    tracing::debug!("{} lists missing module {module}", node.directory.display());
                    continue;
                }
                if seen.insert(child.clone()) {
                    queue.push_back(child);
                }
            }
        }
        Ok(())
    }

    /// Route between two directories, or `None` when their common ancestor
    /// lies outside this project.
    pub fn relative_path(&self, from: &Path, to: &Path) -> Option<RelativePath> {
        relative_path(from, to).filter(|rel| rel.common.starts_with(&self.root))
    }

    /// Work needed to give `target_dir` a manifest wired into the tree.
    /// `None` when `target_dir` is outside the project.
    pub fn plan_module_tree(&self, target_dir: &Path) -> miette::Result<Option<ModuleTreePlan>> {
        let target = canonicalize_lenient(target_dir);
        let Ok(below) = target.strip_prefix(&self.root) else {
            return Ok(None);
        };

        let mut steps = Vec::new();
        let mut parent_dir = self.root.clone();
        let mut parent_exists = true;
        for segment in below.components() {
            let dir = parent_dir.join(segment);
            let name = segment.as_os_str().to_string_lossy().into_owned();
            let create = !dir.join(POM_FILE).is_file();
            let link = !parent_exists || !PomDocument::read(&parent_dir)?.has_module(&name);
            steps.push(TreeStep {
                dir: dir.clone(),
                parent_dir,
                name,
                create,
                link,
            });
            parent_exists = !create;
            parent_dir = dir;
        }

        Ok(Some(ModuleTreePlan {
            target,
            steps,
        }))
    }

    /// Make sure `target_dir` has a manifest reachable from the root,
    /// creating aggregators as needed. `None` when outside the project.
    pub fn create_module_tree(&self, target_dir: &Path) -> miette::Result<Option<ModuleNode>> {
        match self.plan_module_tree(target_dir)? {
            Some(plan) => plan.apply().map(Some),
            None => Ok(None),
        }
    }
}

#[derive(Debug, Clone)]
struct TreeStep {
    dir: PathBuf,
    parent_dir: PathBuf,
    name: String,
    /// No manifest yet; an aggregator will be written.
    create: bool,
    /// The parent does not list this directory as a module yet.
    link: bool,
}

/// Pending manifest writes from [`ProjectTree::plan_module_tree`].
#[derive(Debug, Clone)]
pub struct ModuleTreePlan {
    target: PathBuf,
    steps: Vec<TreeStep>,
}

impl ModuleTreePlan {
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Directories that will receive a new aggregator manifest.
    pub fn created_dirs(&self) -> impl Iterator<Item = &Path> {
        self.steps.iter().filter(|s| s.create).map(|s| s.dir.as_path())
    }

    /// Write the planned manifests, top-down, and return the target module.
    pub fn apply(&self) -> miette::Result<ModuleNode> {
        for step in &self.steps {
            let mut parent = PomDocument::read(&step.parent_dir)?;
            if step.create {
                std::fs::create_dir_all(&step.dir).map_err(PaxError::Io)?;
                let group_id = compound_id(
                    &parent.group_id().unwrap_or_default(),
                    &parent.artifact_id().unwrap_or_default(),
                );
                let aggregator = PomDocument::new_aggregator(
                    &step.dir,
                    &group_id,
                    &step.name,
                    Some((&parent, DEFAULT_RELATIVE_PATH)),
                )?;
                aggregator.write()?;
                tracing::info!("created aggregator {}", aggregator.file().display());
            }
            if step.link && parent.add_module(&step.name, true) {
                parent.write()?;
                tracing::debug!("listed {} in {}", step.name, parent.file().display());
            }
        }
        ModuleNode::read(&self.target)
    }
}
