//! Path scoping for configuration layers
//!
//! A scope is an ordered set of glob patterns deciding which file paths a
//! layer governs. `**` crosses directory separators, `*` matches within a
//! single path segment, literal segments match exactly. Negation patterns
//! are not supported.

use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};

use crate::error::StrataError;
use crate::result::Result;

fn match_options() -> MatchOptions {
    MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    }
}

/// Ordered set of glob patterns attached to a layer
///
/// An empty scope is the global scope: it matches every path.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope {
    patterns: Vec<String>,
}

impl Scope {
    /// The global scope, matching every path
    pub fn global() -> Self {
        Self::default()
    }

    /// Scope restricted to the given glob patterns
    pub fn patterns(patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether this is the global (match-everything) scope
    pub fn is_global(&self) -> bool {
        self.patterns.is_empty()
    }

    /// The raw pattern strings, in declaration order
    pub fn pattern_strs(&self) -> &[String] {
        &self.patterns
    }

    /// Compile the patterns, reporting the first malformed one
    ///
    /// `position` is the owning layer's declared position; it only feeds
    /// error reporting. Validation happens once per composition run,
    /// before any source is resolved.
    pub fn compile(&self, position: usize) -> Result<CompiledScope> {
        let patterns = self
            .patterns
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| StrataError::MalformedScope {
                    pattern: p.clone(),
                    position,
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(CompiledScope { patterns })
    }
}

/// A scope with its patterns compiled and validated
#[derive(Debug, Clone)]
pub struct CompiledScope {
    patterns: Vec<Pattern>,
}

impl CompiledScope {
    /// Whether `path` falls under this scope
    ///
    /// Pure and total: an empty scope matches everything, a non-empty
    /// scope matches if any contained pattern matches.
    pub fn matches(&self, path: &str) -> bool {
        if self.patterns.is_empty() {
            return true;
        }
        let options = match_options();
        self.patterns
            .iter()
            .any(|p| p.matches_with(path, options))
    }
}
