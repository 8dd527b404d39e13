//! Strata Core
//!
//! Layered lint-configuration composition engine. Ordered partial
//! rule-set fragments (static tables and factory-produced bundles) are
//! resolved and merged, per file path, into one effective rule table,
//! with a compatibility layer pinned to the final merge position.

pub mod bundle;
pub mod compose;
pub mod config;
pub mod error;
pub mod result;
pub mod rules;
pub mod scope;
pub mod source;
pub mod style;

// Re-export commonly used types
pub use bundle::{BuildMode, BundleSpec, Bundler, OutputFormat};
pub use compose::{CompositionResult, Layer, LayerComposer, LayerOrigin};
pub use config::{BundleDecl, ComposerConfig, LayerDecl, RuleDecl};
pub use error::{ErrorKind, StrataError};
pub use result::Result;
pub use rules::{RuleSetting, RuleTable, Severity};
pub use scope::{CompiledScope, Scope};
pub use source::{LayerSource, RuleBundleFactory, SourceKind};
pub use style::StyleSettings;

/// Initialize the tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("strata=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
