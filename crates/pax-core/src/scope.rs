use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use pax_util::errors::PaxError;

/// Maven dependency scope, spelled exactly as in a POM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Compile,
    Provided,
    Runtime,
    Test,
    System,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Compile => "compile",
            Scope::Provided => "provided",
            Scope::Runtime => "runtime",
            Scope::Test => "test",
            Scope::System => "system",
        }
    }

    /// Parse an optional `<scope>` value; absence means `compile`.
    pub fn from_pom(value: Option<&str>) -> Result<Self, PaxError> {
        match value.map(str::trim) {
            None | Some("") => Ok(Scope::Compile),
            Some(s) => s.parse(),
        }
    }
}

impl FromStr for Scope {
    type Err = PaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compile" => Ok(Scope::Compile),
            "provided" => Ok(Scope::Provided),
            "runtime" => Ok(Scope::Runtime),
            "test" => Ok(Scope::Test),
            "system" => Ok(Scope::System),
            other => Err(PaxError::Manifest {
                message: format!("Unknown dependency scope '{other}'"),
            }),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides which scope a traversed dependency edge is treated as having.
///
/// With widening enabled every scope except `system` and `test` is normalized
/// to `provided`, so framework dependencies that upstream forgot to mark as
/// provided are still chased transitively.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeResolver {
    widen: bool,
}

impl ScopeResolver {
    pub fn new(widen: bool) -> Self {
        Self { widen }
    }

    /// Effective scope for an edge declared with `declared`.
    pub fn resolve(&self, declared: Scope) -> Scope {
        match declared {
            Scope::System | Scope::Test => declared,
            _ if self.widen => Scope::Provided,
            _ => declared,
        }
    }

    /// Whether an edge with `declared` scope should be followed.
    pub fn is_traversable(&self, declared: Scope) -> bool {
        self.resolve(declared) == Scope::Provided
    }
}
