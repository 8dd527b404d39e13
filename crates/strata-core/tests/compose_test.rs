//! Integration tests for layer composition
//!
//! Covers the behavioral properties of the composer: declaration-order
//! determinism under adversarial factory completion order, compatibility
//! supremacy, scope exclusivity, idempotence, and failure atomicity.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use strata_core::{
    LayerComposer, LayerOrigin, LayerSource, Result, RuleBundleFactory, RuleSetting, RuleTable,
    Scope, Severity, StrataError,
};

fn table(entries: &[(&str, Severity)]) -> RuleTable {
    RuleTable::from_entries(
        entries
            .iter()
            .map(|(id, sev)| (id.to_string(), RuleSetting::severity(*sev))),
        0,
    )
    .unwrap()
}

/// Factory that yields its tables after a fixed delay
struct SlowBundle {
    delay: Duration,
    tables: Vec<RuleTable>,
}

#[async_trait]
impl RuleBundleFactory for SlowBundle {
    async fn produce(&self, _options: &serde_json::Value) -> Result<Vec<RuleTable>> {
        tokio::time::sleep(self.delay).await;
        Ok(self.tables.clone())
    }
}

struct FailingBundle;

#[async_trait]
impl RuleBundleFactory for FailingBundle {
    async fn produce(&self, _options: &serde_json::Value) -> Result<Vec<RuleTable>> {
        Err(StrataError::config_error("registry unreachable"))
    }
}

fn derived(id: &str, scope: Scope, delay_ms: u64, tables: Vec<RuleTable>) -> LayerSource {
    LayerSource::derived(
        id,
        scope,
        Arc::new(SlowBundle {
            delay: Duration::from_millis(delay_ms),
            tables,
        }),
        json!({}),
    )
}

#[tokio::test(start_paused = true)]
async fn completion_order_never_affects_precedence() {
    // The first-declared source finishes long after the second; its
    // setting must still lose to the later-declared layer.
    let mut composer = LayerComposer::new();
    composer
        .push_source(derived(
            "slow-first",
            Scope::global(),
            500,
            vec![table(&[("no-any", Severity::Error)])],
        ))
        .unwrap();
    composer
        .push_source(derived(
            "fast-second",
            Scope::global(),
            1,
            vec![table(&[("no-any", Severity::Warn)])],
        ))
        .unwrap();

    let result = composer.compose().await.unwrap();
    assert_eq!(
        result
            .all_layers()
            .iter()
            .map(|l| l.id.as_str())
            .collect::<Vec<_>>(),
        vec!["slow-first", "fast-second"]
    );
    assert_eq!(
        result.effective_config_for("x.ts").get("no-any").unwrap().severity,
        Severity::Warn
    );
}

#[tokio::test(start_paused = true)]
async fn reversed_delays_yield_identical_result() {
    let build = |first_delay: u64, second_delay: u64| {
        let mut composer = LayerComposer::new();
        composer
            .push_source(derived(
                "a",
                Scope::global(),
                first_delay,
                vec![table(&[("semi", Severity::Error)])],
            ))
            .unwrap();
        composer
            .push_source(derived(
                "b",
                Scope::global(),
                second_delay,
                vec![table(&[("semi", Severity::Off)])],
            ))
            .unwrap();
        composer
    };

    let fast_first = build(1, 300).compose().await.unwrap();
    let slow_first = build(300, 1).compose().await.unwrap();
    assert_eq!(fast_first, slow_first);
}

#[tokio::test]
async fn compatibility_layer_always_wins() {
    let mut composer = LayerComposer::new();
    composer
        .push_source(LayerSource::fixed(
            "global",
            Scope::global(),
            table(&[("no-any", Severity::Error), ("semi", Severity::Warn)]),
        ))
        .unwrap();
    composer
        .push_source(LayerSource::fixed(
            "frontend",
            Scope::patterns(["frontend/**"]),
            table(&[("no-any", Severity::Warn)]),
        ))
        .unwrap();
    composer
        .set_compatibility(LayerSource::fixed(
            "compat",
            Scope::global(),
            table(&[("no-any", Severity::Off)]),
        ))
        .unwrap();

    let result = composer.compose().await.unwrap();

    // Compatibility wins for every path it scopes, whatever the other
    // layers said.
    for path in ["frontend/app.ts", "backend/x.ts", "scripts/build.sh"] {
        let effective = result.effective_config_for(path);
        assert_eq!(effective.get("no-any").unwrap().severity, Severity::Off);
    }
    // Settings it leaves untouched pass through.
    assert_eq!(
        result
            .effective_config_for("backend/x.ts")
            .get("semi")
            .unwrap()
            .severity,
        Severity::Warn
    );
}

#[tokio::test]
async fn worked_example_with_and_without_compat() {
    let sources = || {
        let mut composer = LayerComposer::new();
        composer
            .push_source(LayerSource::fixed(
                "global",
                Scope::global(),
                table(&[("no-any", Severity::Error)]),
            ))
            .unwrap();
        composer
            .push_source(LayerSource::fixed(
                "frontend",
                Scope::patterns(["frontend/**"]),
                table(&[("no-any", Severity::Warn)]),
            ))
            .unwrap();
        composer
    };

    let mut with_compat = sources();
    with_compat
        .set_compatibility(LayerSource::fixed(
            "compat",
            Scope::global(),
            table(&[("no-any", Severity::Off)]),
        ))
        .unwrap();
    let result = with_compat.compose().await.unwrap();
    assert_eq!(
        result
            .effective_config_for("frontend/app.ts")
            .get("no-any")
            .unwrap()
            .severity,
        Severity::Off
    );
    assert_eq!(
        result
            .effective_config_for("backend/x.ts")
            .get("no-any")
            .unwrap()
            .severity,
        Severity::Off
    );

    let result = sources().compose().await.unwrap();
    assert_eq!(
        result
            .effective_config_for("frontend/app.ts")
            .get("no-any")
            .unwrap()
            .severity,
        Severity::Warn
    );
    assert_eq!(
        result
            .effective_config_for("backend/x.ts")
            .get("no-any")
            .unwrap()
            .severity,
        Severity::Error
    );
}

#[tokio::test]
async fn scoped_layer_never_leaks_outside_its_globs() {
    let mut composer = LayerComposer::new();
    composer
        .push_source(LayerSource::fixed(
            "frontend",
            Scope::patterns(["frontend/**/*.vue", "frontend/**/*.ts"]),
            table(&[("vue/attrs-order", Severity::Warn)]),
        ))
        .unwrap();

    let result = composer.compose().await.unwrap();
    assert!(
        result
            .effective_config_for("frontend/components/nav.vue")
            .get("vue/attrs-order")
            .is_some()
    );
    for outside in ["backend/server.ts", "frontend.ts", "docs/frontend/notes.md"] {
        assert!(
            result
                .effective_config_for(outside)
                .get("vue/attrs-order")
                .is_none(),
            "layer leaked into {outside}"
        );
    }
}

#[tokio::test]
async fn composing_the_same_input_twice_is_idempotent() {
    let build = || {
        let mut composer = LayerComposer::new();
        composer
            .push_source(LayerSource::fixed(
                "global",
                Scope::global(),
                table(&[("no-any", Severity::Error)]),
            ))
            .unwrap();
        composer
            .push_source(derived(
                "bundle",
                Scope::patterns(["frontend/**"]),
                5,
                vec![
                    table(&[("vue/attrs-order", Severity::Warn)]),
                    table(&[("vue/no-v-html", Severity::Error)]),
                ],
            ))
            .unwrap();
        composer
            .set_compatibility(LayerSource::fixed(
                "compat",
                Scope::global(),
                table(&[("no-any", Severity::Off)]),
            ))
            .unwrap();
        composer
    };

    let first = build().compose().await.unwrap();
    let second = build().compose().await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn bundle_tables_flatten_in_internal_order() {
    let mut composer = LayerComposer::new();
    composer
        .push_source(derived(
            "nuxt",
            Scope::patterns(["frontend/**"]),
            1,
            vec![
                table(&[("vue/attrs-order", Severity::Warn)]),
                table(&[("vue/attrs-order", Severity::Error)]),
            ],
        ))
        .unwrap();

    let result = composer.compose().await.unwrap();
    let layers = result.all_layers();
    assert_eq!(layers.len(), 2);
    assert_eq!(layers[0].id, "nuxt#0");
    assert_eq!(layers[1].id, "nuxt#1");
    assert_eq!(layers[0].origin, LayerOrigin::Derived);
    assert!(layers[0].order < layers[1].order);
    // Both layers came from the same declared source.
    assert_eq!(layers[0].position, layers[1].position);

    // Bundle-internal order holds at merge time.
    assert_eq!(
        result
            .effective_config_for("frontend/app.vue")
            .get("vue/attrs-order")
            .unwrap()
            .severity,
        Severity::Error
    );
}

#[tokio::test]
async fn factory_failure_rejects_the_whole_run() {
    let mut composer = LayerComposer::new();
    composer
        .push_source(LayerSource::fixed(
            "global",
            Scope::global(),
            table(&[("no-any", Severity::Error)]),
        ))
        .unwrap();
    composer
        .push_source(LayerSource::derived(
            "broken",
            Scope::global(),
            Arc::new(FailingBundle),
            json!({}),
        ))
        .unwrap();

    // No CompositionResult exists on failure; the error names the
    // offending source's declared position.
    let err = composer.compose().await.unwrap_err();
    match err {
        StrataError::LayerResolutionFailed { position, message } => {
            assert_eq!(position, 1);
            assert!(message.contains("registry unreachable"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn derived_compatibility_failure_is_also_fatal() {
    let mut composer = LayerComposer::new();
    composer
        .push_source(LayerSource::fixed("global", Scope::global(), table(&[])))
        .unwrap();
    composer
        .set_compatibility(LayerSource::derived(
            "compat",
            Scope::global(),
            Arc::new(FailingBundle),
            json!({}),
        ))
        .unwrap();

    let err = composer.compose().await.unwrap_err();
    assert!(matches!(
        err,
        StrataError::LayerResolutionFailed { position: 1, .. }
    ));
}
