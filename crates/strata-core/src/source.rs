//! Layer sources: the inputs to a composition run
//!
//! A source either carries a fixed rule table (static) or names an
//! external factory that produces one or more tables when given an
//! options record (derived). Derived sources are how ecosystem rule
//! bundles plug in; the core never looks inside the factory.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::result::Result;
use crate::rules::RuleTable;
use crate::scope::Scope;

/// External collaborator producing rule bundles
///
/// Given a fixed options record, the factory yields one or more rule
/// tables (bundle-internal order is preserved by the composer). A failure
/// aborts the whole composition run; the core performs no retry.
#[async_trait]
pub trait RuleBundleFactory: Send + Sync {
    async fn produce(&self, options: &serde_json::Value) -> Result<Vec<RuleTable>>;
}

/// How a source produces its tables
#[derive(Clone)]
pub enum SourceKind {
    /// A fixed table known at composition time
    Static(RuleTable),
    /// An asynchronous factory invoked with a fixed options record
    Derived {
        factory: Arc<dyn RuleBundleFactory>,
        options: serde_json::Value,
    },
}

impl fmt::Debug for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Static(table) => f.debug_tuple("Static").field(table).finish(),
            SourceKind::Derived { options, .. } => f
                .debug_struct("Derived")
                .field("options", options)
                .finish_non_exhaustive(),
        }
    }
}

/// One declared contribution to the composition
#[derive(Debug, Clone)]
pub struct LayerSource {
    /// Identifier used in errors and introspection output
    pub id: String,
    /// File paths this source governs; empty means global
    pub scope: Scope,
    /// Static table or derived factory
    pub kind: SourceKind,
}

impl LayerSource {
    /// Source carrying a fixed table
    pub fn fixed(id: impl Into<String>, scope: Scope, table: RuleTable) -> Self {
        Self {
            id: id.into(),
            scope,
            kind: SourceKind::Static(table),
        }
    }

    /// Source resolved by invoking `factory` with `options`
    pub fn derived(
        id: impl Into<String>,
        scope: Scope,
        factory: Arc<dyn RuleBundleFactory>,
        options: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            scope,
            kind: SourceKind::Derived { factory, options },
        }
    }
}
