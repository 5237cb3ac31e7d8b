//! End-to-end scenarios: registration, three-tier rendering and the
//! deferred watch lifecycle, driven through the registry's public surface
//! the way reconciliation and watch-setup code uses it.

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    CustomResourceDefinition, CustomResourceDefinitionNames, CustomResourceDefinitionSpec,
    CustomResourceDefinitionVersion,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::Serialize;
use std::fs;
use std::path::Path;

use chartreg_core::Values;
use chartreg_kube::{ComponentConfig, ComponentRegistry, ValuesGenerator, WatchedKind};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct TelemetryConfig {
    replicas: Option<u32>,
    tracing_enabled: bool,
}

fn telemetry_generator() -> ValuesGenerator {
    Box::new(|config| {
        let mut values = Values::new();
        if let Some(replicas) = config.get("replicas").filter(|v| !v.is_null()) {
            values.set("replicas", replicas.clone())?;
        }
        if let Some(enabled) = config.get("tracingEnabled") {
            values.set("features.tracing", enabled.clone())?;
        }
        Ok(values)
    })
}

fn write_telemetry_chart(charts_dir: &Path) {
    let root = charts_dir.join("telemetry");
    fs::create_dir_all(root.join("templates/tests")).unwrap();

    fs::write(
        root.join("Chart.yaml"),
        "name: telemetry\nversion: 0.3.0\nappVersion: \"2.1\"\n",
    )
    .unwrap();
    fs::write(
        root.join("values.yaml"),
        "replicas: 1\nfeatures:\n  tracing: false\n  metrics: true\n",
    )
    .unwrap();
    fs::write(root.join("values.platform.yaml"), "replicas: 2\n").unwrap();
    fs::write(
        root.join("templates/_helpers.tpl"),
        "{% macro fullname(suffix) %}{{ chart.name }}-{{ suffix }}{% endmacro %}",
    )
    .unwrap();
    fs::write(
        root.join("templates/deployment.yaml"),
        concat!(
            "{% from 'templates/_helpers.tpl' import fullname %}",
            "kind: Deployment\n",
            "name: {{ fullname('server') }}\n",
            "replicas: {{ values.replicas }}\n",
            "tracing: {{ values.features.tracing }}\n",
            "metrics: {{ values.features.metrics }}\n",
        ),
    )
    .unwrap();
    fs::write(root.join("templates/NOTES.txt"), "Enjoy {{ chart.name }}!\n").unwrap();
    fs::write(root.join("templates/tests/smoke.yaml"), "kind: Pod\n").unwrap();
}

fn telemetry_config() -> ComponentConfig {
    ComponentConfig {
        chart_name: "telemetry".to_string(),
        values_generator: telemetry_generator(),
        watches: vec![
            WatchedKind::new("apps", "v1", "Deployment"),
            WatchedKind::new("observability.io", "v1alpha1", "TracePipeline"),
        ],
    }
}

fn crd(group: &str, version: &str, kind: &str) -> CustomResourceDefinition {
    CustomResourceDefinition {
        metadata: ObjectMeta {
            name: Some(format!("{}s.{}", kind.to_lowercase(), group)),
            ..Default::default()
        },
        spec: CustomResourceDefinitionSpec {
            group: group.to_string(),
            names: CustomResourceDefinitionNames {
                kind: kind.to_string(),
                plural: format!("{}s", kind.to_lowercase()),
                ..Default::default()
            },
            scope: "Namespaced".to_string(),
            versions: vec![CustomResourceDefinitionVersion {
                name: version.to_string(),
                served: true,
                storage: true,
                ..Default::default()
            }],
            ..Default::default()
        },
        status: None,
    }
}

#[test]
fn three_tier_override_end_to_end() {
    let charts = tempfile::tempdir().unwrap();
    write_telemetry_chart(charts.path());

    let registry = ComponentRegistry::new(charts.path());
    registry.register("telemetry", telemetry_config()).unwrap();

    // No component replicas: the platform tier (2) beats the chart
    // default (1).
    let config = TelemetryConfig {
        replicas: None,
        tracing_enabled: true,
    };
    let manifests = registry.render("telemetry", &config).unwrap();
    let deployment = &manifests["templates/deployment.yaml"];
    assert!(deployment.contains("replicas: 2"), "{deployment}");
    assert!(deployment.contains("tracing: true"), "{deployment}");
    assert!(deployment.contains("metrics: true"), "{deployment}");
    assert!(deployment.contains("name: telemetry-server"), "{deployment}");

    // Component sets replicas: the component tier wins over both.
    let config = TelemetryConfig {
        replicas: Some(3),
        tracing_enabled: true,
    };
    let manifests = registry.render("telemetry", &config).unwrap();
    assert!(manifests["templates/deployment.yaml"].contains("replicas: 3"));

    // Notes and test fixtures never reach the caller.
    assert_eq!(manifests.len(), 1);
}

#[test]
fn concurrent_renders_are_identical() {
    let charts = tempfile::tempdir().unwrap();
    write_telemetry_chart(charts.path());

    let registry = ComponentRegistry::new(charts.path());
    registry.register("telemetry", telemetry_config()).unwrap();

    let config = TelemetryConfig {
        replicas: Some(7),
        tracing_enabled: false,
    };

    let reference = registry.render("telemetry", &config).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| registry.render("telemetry", &config).unwrap())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), reference);
        }
    });
}

#[test]
fn deferred_watch_promotion() {
    let charts = tempfile::tempdir().unwrap();
    write_telemetry_chart(charts.path());

    let registry = ComponentRegistry::new(charts.path());
    registry.register("telemetry", telemetry_config()).unwrap();

    let component = registry.get("telemetry").unwrap();
    assert!(component.watches.has_pending());

    // An unrelated type definition matches nothing.
    let unrelated = crd("other.io", "v1", "Gadget");
    assert!(!component.watches.matches_pending(&unrelated));
    assert!(registry.components_for_crd(&unrelated).is_empty());

    // The watched type's definition appears: the event routes to the
    // owning component and the watch promotes.
    let trace_crd = crd("observability.io", "v1alpha1", "TracePipeline");
    assert_eq!(registry.components_for_crd(&trace_crd), vec!["telemetry"]);
    assert!(component.watches.matches_pending(&trace_crd));

    let kind = WatchedKind::from_crd(&trace_crd);
    assert!(component.watches.promote(&kind));

    // A second presentation of the same definition yields no further
    // state change.
    assert!(!component.watches.matches_pending(&trace_crd));
    assert!(registry.components_for_crd(&trace_crd).is_empty());
    assert!(!component.watches.promote(&kind));
}

#[test]
fn overlapping_watches_route_to_all_owners() {
    let charts = tempfile::tempdir().unwrap();
    write_telemetry_chart(charts.path());

    let registry = ComponentRegistry::new(charts.path());
    registry.register("telemetry", telemetry_config()).unwrap();
    registry
        .register(
            "telemetry-copy",
            ComponentConfig {
                chart_name: "telemetry".to_string(),
                values_generator: telemetry_generator(),
                watches: vec![WatchedKind::new("observability.io", "v1alpha1", "TracePipeline")],
            },
        )
        .unwrap();

    let trace_crd = crd("observability.io", "v1alpha1", "TracePipeline");
    assert_eq!(
        registry.components_for_crd(&trace_crd),
        vec!["telemetry", "telemetry-copy"]
    );

    // Promotion on one component does not affect the other's state.
    let kind = WatchedKind::from_crd(&trace_crd);
    registry.get("telemetry").unwrap().watches.promote(&kind);
    assert_eq!(registry.components_for_crd(&trace_crd), vec!["telemetry-copy"]);
}

#[test]
fn failed_registration_leaves_no_trace() {
    let charts = tempfile::tempdir().unwrap();

    let registry = ComponentRegistry::new(charts.path());
    let err = registry.register("telemetry", telemetry_config()).unwrap_err();

    // The error names the bundle reference for the operator.
    assert!(err.to_string().contains("telemetry"), "{err}");
    assert!(registry.list_names().is_empty());
    assert!(registry.get("telemetry").is_none());
}
