use std::collections::BTreeMap;

use serde_json::json;

use mesh_govern_core::{Category, GovernCfg, GovernError, OverridePrognosis};
use mesh_govern_supervisor::{
    BasicSignalBuilder, GovernSupervisor, TelemetryEvent,
};

fn escalate_failures(signal: &str) -> String {
    if signal.contains("failure") {
        "escalate".to_string()
    } else {
        "ignore".to_string()
    }
}

#[test]
fn ingest_runs_the_full_pipeline() {
    let sup = GovernSupervisor::new(2, GovernCfg::default());
    sup.register_state("config-drift-eu", json!({"replicas": 3}));

    let builder = BasicSignalBuilder::default();
    let adjudicator = escalate_failures;
    let events = vec![
        TelemetryEvent::new("eu", "config-drift-eu", 1).with_commentary("replica divergence"),
        TelemetryEvent::new("eu", "deploy-failure-eu", 2),
        TelemetryEvent::new("eu", "quota-breach-eu", 3),
        TelemetryEvent::new("us", "deploy-failure-us", 4),
    ];

    let report = sup.ingest(&builder, &adjudicator, &events).unwrap();

    // Domains diverge, so no batch-wide consensus.
    assert!(!report.consensus);
    assert_eq!(report.actions.len(), 2);

    let eu = &report.actions[0];
    assert_eq!(eu.domain, "eu");
    // failure > drift > quota per the severity table.
    assert_eq!(
        eu.prioritized,
        vec!["deploy-failure-eu", "config-drift-eu", "quota-breach-eu"]
    );
    assert_eq!(eu.categories[&Category::Drift], vec!["config-drift-eu"]);
    assert_eq!(
        eu.categories[&Category::Other],
        vec!["deploy-failure-eu", "quota-breach-eu"]
    );
    // 1 escalate vs 2 ignore.
    assert_eq!(eu.ruling.verdict, "ignore");
    assert_eq!(eu.ruling.votes, 2);
    assert!(!eu.ruling.tied);
    assert_eq!(eu.prognosis, OverridePrognosis::Unknown);

    // The drift signal retrieved its registered snapshot.
    assert_eq!(eu.remediations.len(), 1);
    assert_eq!(eu.remediations[0].id, "config-drift-eu");
    assert_eq!(eu.remediations[0].snapshot, Some(json!({"replicas": 3})));

    let us = &report.actions[1];
    assert_eq!(us.domain, "us");
    assert_eq!(us.ruling.verdict, "escalate");
    assert!(us.remediations.is_empty());
}

#[test]
fn ingest_empty_batch_is_an_error() {
    let sup = GovernSupervisor::new(1, GovernCfg::default());
    let builder = BasicSignalBuilder::default();

    let err = sup
        .ingest(&builder, &escalate_failures, &[])
        .unwrap_err();
    assert_eq!(err, GovernError::EmptyLogWindow);

    // A batch where the builder drops every malformed event is equally empty.
    let malformed = vec![TelemetryEvent::new("eu", "   ", 1)];
    let err = sup
        .ingest(&builder, &escalate_failures, &malformed)
        .unwrap_err();
    assert_eq!(err, GovernError::EmptyLogWindow);
}

#[test]
fn ingest_reports_consensus_when_all_domains_agree() {
    let sup = GovernSupervisor::new(1, GovernCfg::default());
    let builder = BasicSignalBuilder::default();
    let events = vec![
        TelemetryEvent::new("eu", "heartbeat-ok", 1),
        TelemetryEvent::new("us", "heartbeat-ok", 2),
        TelemetryEvent::new("ap", "heartbeat-ok", 3),
    ];

    let report = sup.ingest(&builder, &escalate_failures, &events).unwrap();
    assert!(report.consensus);
    assert_eq!(report.actions.len(), 3);
}

#[test]
fn drift_remediation_misses_are_reported_not_fatal() {
    let sup = GovernSupervisor::new(1, GovernCfg::default());
    let builder = BasicSignalBuilder::default();
    let events = vec![TelemetryEvent::new("eu", "drift-unseen", 1)];

    let report = sup.ingest(&builder, &escalate_failures, &events).unwrap();
    let eu = &report.actions[0];
    assert_eq!(eu.remediations.len(), 1);
    assert_eq!(eu.remediations[0].snapshot, None);
}

#[test]
fn per_domain_cfg_overrides_change_triage() {
    let mut sup = GovernSupervisor::new(1, GovernCfg::default());
    // In the "edge" domain, quota outranks everything.
    sup.set_cfg_override(
        "edge",
        GovernCfg {
            severity_keywords: vec!["quota".to_string(), "failure".to_string()],
            ..GovernCfg::default()
        },
    );

    let builder = BasicSignalBuilder::default();
    let events = vec![
        TelemetryEvent::new("edge", "link-failure", 1),
        TelemetryEvent::new("edge", "quota-spike", 2),
        TelemetryEvent::new("core", "link-failure", 3),
        TelemetryEvent::new("core", "quota-spike", 4),
    ];

    let report = sup.ingest(&builder, &escalate_failures, &events).unwrap();
    let edge = &report.actions[1];
    assert_eq!(edge.domain, "edge");
    assert_eq!(edge.prioritized, vec!["quota-spike", "link-failure"]);

    let core = &report.actions[0];
    assert_eq!(core.domain, "core");
    assert_eq!(core.prioritized, vec!["link-failure", "quota-spike"]);
}

#[test]
fn prognosis_surfaces_for_matching_domains() {
    let sup = GovernSupervisor::new(1, GovernCfg::default());
    let builder = BasicSignalBuilder::default();
    // "escalation" is the top (only) signal in the "quota" domain.
    let events = vec![TelemetryEvent::new("quota", "escalation", 1)];

    let report = sup.ingest(&builder, &escalate_failures, &events).unwrap();
    assert_eq!(
        report.actions[0].prognosis,
        OverridePrognosis::TriggerReallocation
    );
}

#[test]
fn register_rollback_and_clear() {
    let sup = GovernSupervisor::new(4, GovernCfg::default());
    assert!(!sup.register_state("x", json!([1, 2, 3])));
    assert!(sup.register_state("x", json!([4])));
    assert_eq!(sup.rollback("x").unwrap(), json!([4]));

    sup.clear_state("x");
    assert_eq!(
        sup.rollback("x").unwrap_err(),
        GovernError::SnapshotNotFound { id: "x".to_string() }
    );
}

#[test]
fn snapshot_restore_round_trip() {
    let sup = GovernSupervisor::new(3, GovernCfg::default());
    sup.register_state("b", json!(2));
    sup.register_state("a", json!(1));
    sup.register_state("c", json!({"nested": true}));

    let snap = sup.snapshot();
    // Deterministic ordering regardless of shard layout.
    let ids: Vec<&str> = snap.entries.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);

    // Restore into a supervisor with a different shard count.
    let other = GovernSupervisor::new(1, GovernCfg::default());
    other.register_state("stale", json!(0));
    let stats = other.restore(snap.clone());
    assert_eq!(stats.applied, 3);
    assert_eq!(stats.overwritten, 0);
    // Replace mode dropped the stale entry.
    assert!(other.rollback("stale").is_err());
    assert_eq!(other.rollback("c").unwrap(), json!({"nested": true}));

    // Merge mode keeps unrelated live entries.
    let merged = GovernSupervisor::new(2, GovernCfg::default());
    merged.register_state("live", json!("keep"));
    merged.register_state("a", json!("old"));
    let stats = merged.restore_merge(snap);
    assert_eq!(stats.applied, 3);
    assert_eq!(stats.overwritten, 1);
    assert_eq!(merged.rollback("live").unwrap(), json!("keep"));
    assert_eq!(merged.rollback("a").unwrap(), json!(1));
}

#[test]
fn snapshot_filtered_keeps_only_matching_entries() {
    let sup = GovernSupervisor::new(2, GovernCfg::default());
    sup.register_state("cfg-eu", json!(1));
    sup.register_state("cfg-us", json!(2));
    sup.register_state("tmp-scratch", json!(3));

    let snap = sup.snapshot_filtered(|id, _| id.starts_with("cfg-"));
    assert_eq!(snap.entries.len(), 2);
    assert!(snap.entries.iter().all(|(id, _)| id.starts_with("cfg-")));
}

#[test]
fn reallocate_passthrough_matches_core() {
    let sup = GovernSupervisor::new(1, GovernCfg::default());
    let mut usage = BTreeMap::new();
    usage.insert("a".to_string(), 100);
    usage.insert("b".to_string(), 300);

    let adjusted = sup.reallocate(&usage, 200);
    assert_eq!(adjusted["a"], 50);
    assert_eq!(adjusted["b"], 150);
}
