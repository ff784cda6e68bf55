//! Breadth-first walk over provided dependencies, emitting one import action
//! per bundle found.

use std::collections::{HashSet, VecDeque};

use pax_core::coordinate::Coordinate;
use pax_core::scope::ScopeResolver;
use pax_maven::bundle::BundleClassifier;
use pax_maven::source::ArtifactSource;

/// Knobs for one resolver run.
#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions {
    /// Stop at the first bundle found.
    pub exclude_transitive: bool,
    /// Treat every non-test, non-system dependency as provided.
    pub widen_scope: bool,
    /// Let the classifier open artifact files to look for OSGi headers.
    pub test_metadata: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            exclude_transitive: false,
            widen_scope: false,
            test_metadata: true,
        }
    }
}

/// A bundle to record in the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportAction {
    pub coordinate: Coordinate,
    /// Display name of the module, for status output.
    pub name: String,
}

/// Outcome of a resolver run. Failures on individual nodes end up in
/// `warnings`; they never abort the walk.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub actions: Vec<ImportAction>,
    pub warnings: Vec<String>,
    /// Number of modules whose description was resolved.
    pub resolved: usize,
}

pub struct ArtifactGraphResolver<'a> {
    source: &'a dyn ArtifactSource,
    classifier: &'a dyn BundleClassifier,
}

impl<'a> ArtifactGraphResolver<'a> {
    pub fn new(source: &'a dyn ArtifactSource, classifier: &'a dyn BundleClassifier) -> Self {
        Self { source, classifier }
    }

    /// Walk the graph below `root` in FIFO order.
    ///
    /// Each identity key is enqueued at most once. Only non-optional edges
    /// whose effective scope is `provided` are followed.
    pub fn resolve(&self, root: &Coordinate, options: &ResolveOptions) -> Resolution {
        let scopes = ScopeResolver::new(options.widen_scope);
        let mut result = Resolution::default();
        let mut visited: HashSet<String> = HashSet::from([root.key()]);
        let mut queue: VecDeque<Coordinate> = VecDeque::from([root.clone()]);

        while let Some(candidate) = queue.pop_front() {
            let module = match self.source.resolve_module(&candidate) {
                Ok(module) => module,
                Err(e) => {
                    tracing::warn!("unable to resolve {candidate}: {e}");
                    result.warnings.push(format!("Unable to resolve {candidate}: {e}"));
                    continue;
                }
            };
            result.resolved += 1;

            if module.is_aggregator() {
                tracing::debug!("{candidate} is an aggregator, expanding only");
            } else {
                match self.classifier.is_bundle(&module, self.source, options.test_metadata) {
                    Ok(true) => {
                        tracing::info!("found bundle {candidate}");
                        result.actions.push(ImportAction {
                            coordinate: candidate.clone(),
                            name: module.name.clone(),
                        });
                        if options.exclude_transitive {
                            return result;
                        }
                    }
                    Ok(false) => tracing::debug!("{candidate} is not a bundle"),
                    Err(e) => {
                        tracing::warn!("unable to inspect {candidate}: {e}");
                        result.warnings.push(format!("Unable to inspect {candidate}: {e}"));
                    }
                }
            }

            for edge in &module.dependencies {
                if edge.optional || !scopes.is_traversable(edge.scope) {
                    continue;
                }
                if visited.insert(edge.target.key()) {
                    tracing::debug!("queueing {} from {candidate}", edge.target);
                    queue.push_back(edge.target.clone());
                }
            }
        }

        result
    }
}
