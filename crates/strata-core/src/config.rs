//! Composition declaration files
//!
//! A declaration file describes a composition run: global ignore
//! patterns, an ordered list of static layers, the distinguished
//! compatibility layer, opaque style settings, and the bundler
//! entry/target record. JSON and TOML are supported; the format is
//! sniffed from the content when the extension is missing.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use glob::Pattern;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bundle::{BuildMode, BundleSpec, OutputFormat};
use crate::compose::LayerComposer;
use crate::error::StrataError;
use crate::result::Result;
use crate::rules::{RuleSetting, RuleTable, Severity};
use crate::scope::Scope;
use crate::source::LayerSource;
use crate::style::StyleSettings;

/// Top-level declaration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Global ignore globs, forwarded to the file-discovery boundary
    pub ignores: Vec<String>,
    /// Ordered layer declarations
    pub layers: Vec<LayerDecl>,
    /// The layer pinned to the final merge position
    pub compatibility: Option<LayerDecl>,
    /// Opaque formatter settings
    pub style: StyleSettings,
    /// Bundler entry/target record
    pub bundle: Option<BundleDecl>,
}

/// One declared layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerDecl {
    /// Identifier used in errors and introspection
    pub id: String,
    /// Glob patterns this layer governs; empty means every path
    pub files: Vec<String>,
    /// Rule settings contributed by this layer
    pub rules: HashMap<String, RuleDecl>,
}

/// A rule setting as written in a declaration file
///
/// Either a bare severity (`"warn"`), a `[severity, options]` pair
/// (`["error", "unix"]`), or the explicit form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleDecl {
    Severity(Severity),
    WithOptions(Severity, serde_json::Value),
    Full {
        severity: Severity,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        options: Option<serde_json::Value>,
    },
}

impl RuleDecl {
    fn into_setting(self) -> RuleSetting {
        match self {
            RuleDecl::Severity(severity) => RuleSetting::severity(severity),
            RuleDecl::WithOptions(severity, options) => {
                RuleSetting::with_options(severity, options)
            }
            RuleDecl::Full { severity, options } => RuleSetting { severity, options },
        }
    }
}

/// Declared bundler entries and target; the build mode arrives at run
/// time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleDecl {
    /// Entry point globs, in order
    pub entries: Vec<String>,
    /// Emitted module format
    pub format: OutputFormat,
    /// Target runtime version tag
    pub target: String,
}

impl BundleDecl {
    /// Package the record for the external bundler, deriving `minify`
    /// from the build mode
    pub fn to_spec(&self, mode: BuildMode) -> BundleSpec {
        BundleSpec::new(self.entries.iter().cloned(), self.format, &self.target, mode)
    }
}

impl ComposerConfig {
    /// Load and validate a declaration file
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|e| StrataError::io_error(path, e))?;
        debug!(path = %path.display(), "loading composition declaration");
        Self::parse(&content, path)
    }

    /// Parse declaration content based on file extension
    fn parse(content: &str, path: &Path) -> Result<Self> {
        let extension = path.extension().and_then(|ext| ext.to_str());
        match extension {
            Some("toml") => Self::from_toml(content),
            Some("json") => Self::from_json(content),
            _ => {
                // Detect format by content
                if content.trim_start().starts_with('{') {
                    Self::from_json(content)
                } else {
                    Self::from_toml(content)
                }
            }
        }
    }

    /// Deserialize from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| StrataError::ConfigError {
            message: format!("Failed to parse JSON declaration: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Deserialize from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| StrataError::ConfigError {
            message: format!("Failed to parse TOML declaration: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the declaration for correctness
    ///
    /// Layer scopes are validated again by the composer before
    /// resolution; checking here reports problems at load time, with the
    /// declaring layer's position.
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.ignores {
            Pattern::new(pattern).map_err(|e| StrataError::ConfigError {
                message: format!("Invalid ignore pattern '{pattern}': {e}"),
            })?;
        }

        for (position, layer) in self.layers.iter().enumerate() {
            layer.validate(position)?;
        }
        if let Some(compat) = &self.compatibility {
            compat.validate(self.layers.len())?;
        }

        if let Some(bundle) = &self.bundle {
            if bundle.entries.is_empty() {
                return Err(StrataError::config_error(
                    "Bundle entry globs cannot be empty",
                ));
            }
        }

        Ok(())
    }

    /// Build a composer from the declared layers
    ///
    /// Every declared layer becomes a static source in declaration order;
    /// the compatibility declaration, if present, is registered as the
    /// pinned tail source.
    pub fn into_composer(self) -> Result<LayerComposer> {
        let mut composer = LayerComposer::new();
        let compat_position = self.layers.len();
        for (position, layer) in self.layers.into_iter().enumerate() {
            composer.push_source(layer.into_source(position)?)?;
        }
        if let Some(compat) = self.compatibility {
            composer.set_compatibility(compat.into_source(compat_position)?)?;
        }
        Ok(composer)
    }
}

impl LayerDecl {
    fn validate(&self, position: usize) -> Result<()> {
        if self.id.is_empty() {
            return Err(StrataError::ConfigError {
                message: format!("Layer at position {position} has an empty id"),
            });
        }
        Scope::patterns(self.files.iter().cloned()).compile(position)?;
        Ok(())
    }

    fn into_source(self, position: usize) -> Result<LayerSource> {
        let scope = Scope::patterns(self.files);
        let table = RuleTable::from_entries(
            self.rules
                .into_iter()
                .map(|(id, decl)| (id, decl.into_setting())),
            position,
        )?;
        Ok(LayerSource::fixed(self.id, scope, table))
    }
}
