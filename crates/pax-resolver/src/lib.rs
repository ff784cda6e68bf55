//! Artifact graph resolution: walks the provided-scope dependency graph of a
//! root coordinate and decides which modules to import as bundles.

pub mod resolver;

pub use resolver::{ArtifactGraphResolver, ImportAction, Resolution, ResolveOptions};
