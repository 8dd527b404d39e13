//! Layer composition
//!
//! Resolves an ordered list of layer sources (awaiting derived factories),
//! flattens them into ordered, scope-tagged layers, and pins the
//! compatibility source to the tail. Merging into an effective per-path
//! table is deferred to query time.

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::StrataError;
use crate::result::Result;
use crate::rules::RuleTable;
use crate::scope::{CompiledScope, Scope};
use crate::source::{LayerSource, SourceKind};

/// How a layer came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerOrigin {
    /// Declared as a fixed table
    Static,
    /// Produced by a rule-bundle factory
    Derived,
}

/// One resolved, immutable, scope-and-order-tagged contribution
#[derive(Debug, Clone)]
pub struct Layer {
    /// Source id, suffixed with the bundle sub-index for multi-table
    /// sources
    pub id: String,
    /// Raw scope patterns, kept for introspection
    pub scope: Scope,
    /// This layer's rule contribution
    pub table: RuleTable,
    /// Static or derived
    pub origin: LayerOrigin,
    /// Merge precedence; strictly increasing across the layer list
    pub order: usize,
    /// Declared position of the producing source
    pub position: usize,
    matcher: CompiledScope,
}

impl Layer {
    /// Whether this layer governs `path`
    pub fn matches(&self, path: &str) -> bool {
        self.matcher.matches(path)
    }
}

impl PartialEq for Layer {
    fn eq(&self, other: &Self) -> bool {
        // The compiled matcher is derived from `scope`; comparing it
        // would be redundant.
        self.id == other.id
            && self.scope == other.scope
            && self.table == other.table
            && self.origin == other.origin
            && self.order == other.order
            && self.position == other.position
    }
}

/// Orchestrates resolution and ordering of layer sources
///
/// Sources merge in declaration order; the distinguished compatibility
/// source always merges last, regardless of when it was registered.
/// Appending a source after the compatibility source is registered is
/// rejected, which makes the tail-pinning invariant structural.
#[derive(Default)]
pub struct LayerComposer {
    sources: Vec<LayerSource>,
    compatibility: Option<LayerSource>,
}

impl LayerComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source at the next declaration position
    pub fn push_source(&mut self, source: LayerSource) -> Result<()> {
        if self.compatibility.is_some() {
            return Err(StrataError::CompatibilitySealed { id: source.id });
        }
        self.sources.push(source);
        Ok(())
    }

    /// Register the compatibility source, sealing the source list
    pub fn set_compatibility(&mut self, source: LayerSource) -> Result<()> {
        if self.compatibility.is_some() {
            return Err(StrataError::config_error(
                "compatibility source already registered",
            ));
        }
        self.compatibility = Some(source);
        Ok(())
    }

    /// Resolve every source and produce the ordered layer list
    ///
    /// All scopes are validated before any source resolves, so a
    /// malformed pattern aborts without invoking a factory. Derived
    /// factories run concurrently; their results are recorded in
    /// declaration order, so completion order never affects precedence.
    /// Any failure rejects the whole run; no partial result exists.
    #[instrument(skip(self), fields(sources = self.sources.len()))]
    pub async fn compose(self) -> Result<CompositionResult> {
        let compat_position = self.sources.len();

        // Scope validation, before any resolution.
        let matchers = self
            .sources
            .iter()
            .enumerate()
            .map(|(position, source)| source.scope.compile(position))
            .collect::<Result<Vec<_>>>()?;
        let compat_matcher = match &self.compatibility {
            Some(source) => Some(source.scope.compile(compat_position)?),
            None => None,
        };

        // Concurrent resolution, declaration-order effects.
        let resolutions = try_join_all(
            self.sources
                .iter()
                .enumerate()
                .map(|(position, source)| resolve_source(source, position)),
        )
        .await?;

        let mut layers = Vec::new();
        let mut order = 0usize;
        for (position, ((source, matcher), tables)) in
            self.sources.iter().zip(matchers).zip(resolutions).enumerate()
        {
            flatten(source, matcher, tables, position, &mut order, &mut layers);
        }

        // The compatibility source resolves last and outranks everything.
        if let (Some(source), Some(matcher)) = (&self.compatibility, compat_matcher) {
            let tables = resolve_source(source, compat_position).await?;
            flatten(source, matcher, tables, compat_position, &mut order, &mut layers);
        }

        debug!(layers = layers.len(), "composition complete");
        Ok(CompositionResult { layers })
    }
}

async fn resolve_source(source: &LayerSource, position: usize) -> Result<Vec<RuleTable>> {
    match &source.kind {
        SourceKind::Static(table) => Ok(vec![table.clone()]),
        SourceKind::Derived { factory, options } => {
            debug!(id = %source.id, position, "resolving derived source");
            factory
                .produce(options)
                .await
                .map_err(|e| StrataError::resolution_failed(position, e.to_string()))
        }
    }
}

fn flatten(
    source: &LayerSource,
    matcher: CompiledScope,
    tables: Vec<RuleTable>,
    position: usize,
    order: &mut usize,
    layers: &mut Vec<Layer>,
) {
    let origin = match source.kind {
        SourceKind::Static(_) => LayerOrigin::Static,
        SourceKind::Derived { .. } => LayerOrigin::Derived,
    };
    let bundle = tables.len() > 1;
    for (sub, table) in tables.into_iter().enumerate() {
        let id = if bundle {
            format!("{}#{sub}", source.id)
        } else {
            source.id.clone()
        };
        layers.push(Layer {
            id,
            scope: source.scope.clone(),
            table,
            origin,
            order: *order,
            position,
            matcher: matcher.clone(),
        });
        *order += 1;
    }
}

/// The resolved, ordered layer list of one composition run
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionResult {
    layers: Vec<Layer>,
}

impl CompositionResult {
    /// Ordered layers, compatibility last, for introspection and tests
    pub fn all_layers(&self) -> &[Layer] {
        &self.layers
    }

    /// The effective rule table for `path`
    ///
    /// Folds the tables of every layer whose scope matches `path`, in
    /// ascending order; the last write per rule identifier wins. Pure and
    /// total: paths matched by nothing yield the global-only (possibly
    /// empty) table. Results are not cached, but the function is
    /// idempotent and safe to memoize.
    pub fn effective_config_for(&self, path: &str) -> RuleTable {
        let mut effective = RuleTable::new();
        for layer in &self.layers {
            if layer.matches(path) {
                effective.apply(&layer.table);
            }
        }
        effective
    }
}
