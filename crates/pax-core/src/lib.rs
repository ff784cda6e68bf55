//! Core data types for pax-construct.
//!
//! This crate defines the value types shared by the resolver and the
//! project-tree operations: Maven coordinates, dependency edges, dependency
//! scopes with their widening policy, and the global configuration.
//!
//! This crate is intentionally free of network I/O and XML handling.

/// Default artifact type of a coordinate.
pub const DEFAULT_TYPE: &str = "jar";

/// Well-known module name holding the shared provisioning manifest.
pub const DEFAULT_PROVISION_ID: &str = "provision";

pub mod config;
pub mod coordinate;
pub mod scope;
