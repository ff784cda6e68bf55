//! Shared utilities for pax-construct.
//!
//! This crate provides cross-cutting concerns used by all other pax crates:
//! error types, filesystem and relative-path helpers, process spawning,
//! and terminal progress indicators.

pub mod errors;
pub mod fs;
pub mod process;
pub mod progress;
