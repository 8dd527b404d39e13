//! Bundler boundary
//!
//! The build entry/target record is opaque configuration data handed to
//! an external bundler. The core packages and forwards it unchanged; it
//! never interprets the globs or the target tag, and the composition
//! result is never passed across this boundary.

use serde::{Deserialize, Serialize};

use crate::result::Result;

/// Output module format tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Esm,
    Cjs,
    Iife,
}

/// Build mode the caller is running in
///
/// Watch builds skip minification; release builds minify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    Watch,
    Release,
}

impl BuildMode {
    /// Whether artifacts built in this mode are minified
    pub fn minify(self) -> bool {
        matches!(self, BuildMode::Release)
    }
}

/// Entry/target record consumed by the external bundler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleSpec {
    /// Glob patterns identifying source entry points, in order
    pub entry_globs: Vec<String>,
    /// Emitted module format
    pub output_format: OutputFormat,
    /// Whether to minify, derived from the build mode
    pub minify: bool,
    /// Target runtime version tag, forwarded verbatim
    pub target: String,
}

impl BundleSpec {
    /// Assemble a spec for the given build mode
    pub fn new(
        entry_globs: impl IntoIterator<Item = impl Into<String>>,
        output_format: OutputFormat,
        target: impl Into<String>,
        mode: BuildMode,
    ) -> Self {
        Self {
            entry_globs: entry_globs.into_iter().map(Into::into).collect(),
            output_format,
            minify: mode.minify(),
            target: target.into(),
        }
    }
}

/// External collaborator that turns a [`BundleSpec`] into build artifacts
pub trait Bundler {
    fn emit(&self, spec: &BundleSpec) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minify_follows_build_mode() {
        let watch = BundleSpec::new(
            ["src/endpoints/**/*.ts", "src/cron/**/*.ts"],
            OutputFormat::Esm,
            "node20",
            BuildMode::Watch,
        );
        assert!(!watch.minify);

        let release = BundleSpec::new(
            ["src/endpoints/**/*.ts"],
            OutputFormat::Esm,
            "node20",
            BuildMode::Release,
        );
        assert!(release.minify);
    }

    #[test]
    fn spec_serializes_with_lowercase_tags() {
        let spec = BundleSpec::new(["src/**/*.ts"], OutputFormat::Cjs, "node20", BuildMode::Release);
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["output_format"], "cjs");
        assert_eq!(json["entry_globs"][0], "src/**/*.ts");
        assert_eq!(json["minify"], true);
    }
}
