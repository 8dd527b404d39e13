//! Command implementations for the strata CLI

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, bail};
use strata_core::{BuildMode, ComposerConfig, CompositionResult, LayerOrigin};
use tracing::info;

async fn compose_from(config_path: &Path) -> anyhow::Result<(ComposerConfig, CompositionResult)> {
    let config = ComposerConfig::load(config_path)
        .with_context(|| format!("loading declaration '{}'", config_path.display()))?;
    let result = config.clone().into_composer()?.compose().await?;
    info!(
        layers = result.all_layers().len(),
        "composition succeeded"
    );
    Ok((config, result))
}

/// Validate the declaration and run a full composition
pub async fn check(config_path: &Path) -> anyhow::Result<()> {
    let (config, result) = compose_from(config_path).await?;
    println!(
        "ok: {} layer(s), {} ignore pattern(s){}",
        result.all_layers().len(),
        config.ignores.len(),
        if config.bundle.is_some() {
            ", bundle spec present"
        } else {
            ""
        }
    );
    Ok(())
}

/// Print the resolved layer list in merge order
pub async fn layers(config_path: &Path) -> anyhow::Result<()> {
    let (_, result) = compose_from(config_path).await?;
    for layer in result.all_layers() {
        let origin = match layer.origin {
            LayerOrigin::Static => "static",
            LayerOrigin::Derived => "derived",
        };
        let scope = if layer.scope.is_global() {
            "*".to_string()
        } else {
            layer.scope.pattern_strs().join(", ")
        };
        println!(
            "{:>3}  {:<8} {:<24} [{}]  ({} rule(s))",
            layer.order,
            origin,
            layer.id,
            scope,
            layer.table.len()
        );
    }
    Ok(())
}

/// Print the effective rule table for each path as pretty JSON
pub async fn show(config_path: &Path, paths: &[String]) -> anyhow::Result<()> {
    let (_, result) = compose_from(config_path).await?;
    for path in paths {
        let effective = result.effective_config_for(path);
        // Sort rule ids for stable output.
        let rendered: BTreeMap<&str, serde_json::Value> = effective
            .iter()
            .map(|(rule_id, setting)| {
                (rule_id, serde_json::to_value(setting).unwrap_or_default())
            })
            .collect();
        println!("{path}:");
        println!("{}", serde_json::to_string_pretty(&rendered)?);
    }
    Ok(())
}

/// Print the entry/target record forwarded to the external bundler
pub fn bundle(config_path: &Path, release: bool) -> anyhow::Result<()> {
    let config = ComposerConfig::load(config_path)
        .with_context(|| format!("loading declaration '{}'", config_path.display()))?;
    let Some(decl) = &config.bundle else {
        bail!("declaration '{}' has no bundle section", config_path.display());
    };
    let mode = if release {
        BuildMode::Release
    } else {
        BuildMode::Watch
    };
    let spec = decl.to_spec(mode);
    println!("{}", serde_json::to_string_pretty(&spec)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const DECLARATION: &str = r#"
    {
        "layers": [
            { "id": "global", "rules": { "no-any": "error" } },
            {
                "id": "frontend",
                "files": ["frontend/**"],
                "rules": { "no-any": "warn" }
            }
        ],
        "compatibility": { "id": "compat", "rules": { "no-any": "off" } },
        "bundle": {
            "entries": ["src/**/*.ts"],
            "format": "esm",
            "target": "node20"
        }
    }
    "#;

    fn write_declaration() -> (TempDir, std::path::PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("strata.json");
        fs::write(&path, DECLARATION).unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn check_accepts_valid_declaration() {
        let (_dir, path) = write_declaration();
        assert!(check(&path).await.is_ok());
    }

    #[tokio::test]
    async fn show_and_layers_run_on_valid_declaration() {
        let (_dir, path) = write_declaration();
        assert!(layers(&path).await.is_ok());
        assert!(show(&path, &["frontend/app.ts".to_string()]).await.is_ok());
    }

    #[tokio::test]
    async fn bundle_requires_bundle_section() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("strata.json");
        fs::write(&path, r#"{ "layers": [] }"#).unwrap();
        assert!(bundle(&path, true).is_err());
    }

    #[tokio::test]
    async fn check_rejects_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");
        assert!(check(&path).await.is_err());
    }
}
