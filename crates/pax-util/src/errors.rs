use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all pax-construct operations.
#[derive(Debug, Error, Diagnostic)]
pub enum PaxError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or malformed manifest (pom.xml).
    #[error("Manifest error: {message}")]
    #[diagnostic(help("Check the pom.xml for syntax errors"))]
    Manifest { message: String },

    /// A coordinate could not be resolved or its POM could not be read.
    #[error("Dependency resolution failed: {message}")]
    Resolution { message: String },

    /// A module or directory could not be found.
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// The target directory cannot be reached from the project tree.
    #[error("{message}")]
    #[diagnostic(help("Choose a target directory inside the current project tree"))]
    TreeBoundary { message: String },

    /// The module directory could not be relocated; no manifest was changed.
    #[error("{message}")]
    MoveFailed { message: String },

    /// Manifest bookkeeping failed after the module directory was relocated.
    #[error("{message}")]
    #[diagnostic(help(
        "The module directory has already moved; check <module> and <relativePath> entries by hand"
    ))]
    PostMoveInconsistency { message: String },

    /// The operation would leave the project tree in an unsafe state.
    #[error("{message}")]
    SafetyViolation { message: String },

    /// Network request or download failed.
    #[error("Network error: {message}")]
    Network { message: String },

    /// An external process could not be run or failed.
    #[error("Process error: {message}")]
    Process { message: String },

    /// Global configuration could not be read.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type PaxResult<T> = miette::Result<T>;
