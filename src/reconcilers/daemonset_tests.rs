// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `daemonset.rs`

use super::*;
use crate::drift::DifferenceKind;
use crate::errors::{SpecSide, SynthesisError};
use k8s_openapi::api::core::v1::Container;
use std::collections::BTreeMap;

fn create_test_inputs() -> SynthesisInputs {
    SynthesisInputs {
        cluster_service_ip: "172.30.0.10".into(),
        cluster_domain: "cluster.local".into(),
        agent_image: "registry.example.com/coredns:1.11".into(),
        tooling_image: "registry.example.com/cli:1.0".into(),
    }
}

fn desired() -> DaemonSet {
    build_dns_daemonset(&WorkloadIdentity::default(), &create_test_inputs()).unwrap()
}

/// The desired object as the API server would return it.
fn live() -> DaemonSet {
    let mut ds = desired();
    ds.metadata.uid = Some("0b4f6c2e".into());
    ds.metadata.resource_version = Some("4242".into());
    ds
}

fn containers_mut(ds: &mut DaemonSet) -> &mut Vec<Container> {
    &mut ds
        .spec
        .as_mut()
        .unwrap()
        .template
        .spec
        .as_mut()
        .unwrap()
        .containers
}

#[test]
fn test_plan_creates_missing_daemonset() {
    let plan = plan_daemonset(None, desired()).unwrap();

    assert_eq!(plan, DaemonSetPlan::Create(desired()));
}

#[test]
fn test_plan_leaves_matching_daemonset_alone() {
    let current = live();

    let plan = plan_daemonset(Some(&current), desired()).unwrap();

    assert_eq!(plan, DaemonSetPlan::Unchanged);
}

#[test]
fn test_plan_updates_drifted_image() {
    let mut current = live();
    containers_mut(&mut current)[0].image = Some("registry.example.com/coredns:old".into());

    let plan = plan_daemonset(Some(&current), desired()).unwrap();

    let DaemonSetPlan::Update {
        corrected,
        differences,
    } = plan
    else {
        panic!("expected an update plan, got {plan:?}");
    };
    assert_eq!(differences.len(), 1);
    assert_eq!(differences[0].path, "image");
    assert_eq!(differences[0].container.as_deref(), Some("dns"));
    assert_eq!(differences[0].kind, DifferenceKind::Modified);
    // The write goes against the live resource version
    assert_eq!(corrected.metadata.resource_version.as_deref(), Some("4242"));
    assert_eq!(corrected.metadata.uid.as_deref(), Some("0b4f6c2e"));
}

#[test]
fn test_plan_recreates_on_selector_drift() {
    let mut current = live();
    let mut selector = BTreeMap::new();
    selector.insert("app".to_string(), "legacy-dns".to_string());
    current.spec.as_mut().unwrap().selector.match_labels = Some(selector);

    let plan = plan_daemonset(Some(&current), desired()).unwrap();

    match plan {
        DaemonSetPlan::Recreate {
            desired: recreated,
            differences,
        } => {
            assert_eq!(recreated, desired());
            assert!(differences.iter().any(|d| d.path == "spec.selector"));
        }
        other => panic!("expected a recreate plan, got {other:?}"),
    }
}

#[test]
fn test_plan_waits_for_terminating_daemonset() {
    let mut value = serde_json::to_value(live()).unwrap();
    value["metadata"]["deletionTimestamp"] = serde_json::json!("2025-06-01T12:00:00Z");
    let current: DaemonSet = serde_json::from_value(value).unwrap();

    let plan = plan_daemonset(Some(&current), desired()).unwrap();

    assert_eq!(plan, DaemonSetPlan::WaitForDeletion);
}

#[test]
fn test_plan_rejects_duplicate_live_containers() {
    let mut current = live();
    let duplicate = containers_mut(&mut current)[0].clone();
    containers_mut(&mut current).push(duplicate);

    let err = plan_daemonset(Some(&current), desired()).unwrap_err();

    let DriftError::InconsistentSpec { side, .. } = err;
    assert_eq!(side, SpecSide::Current);
}

#[test]
fn test_outcome_as_str() {
    assert_eq!(DaemonSetOutcome::Created.as_str(), "created");
    assert_eq!(DaemonSetOutcome::Updated.as_str(), "updated");
    assert_eq!(DaemonSetOutcome::Recreated.as_str(), "recreated");
    assert_eq!(DaemonSetOutcome::Terminating.as_str(), "terminating");
    assert_eq!(DaemonSetOutcome::Unchanged.as_str(), "unchanged");
}

#[test]
fn test_summarize_differences() {
    let mut current = live();
    containers_mut(&mut current).retain(|c| c.name == "dns");
    containers_mut(&mut current)[0].args = None;

    let DaemonSetPlan::Update { differences, .. } =
        plan_daemonset(Some(&current), desired()).unwrap()
    else {
        panic!("expected an update plan");
    };

    assert_eq!(
        summarize_differences(&differences),
        "spec.template.spec.containers[dns-node-resolver] added, containers[dns].args modified"
    );
}

#[test]
fn test_error_type() {
    let synthesis: anyhow::Error = NodeDnsError::from(SynthesisError::InvalidInput {
        field: "cluster_domain",
        reason: "must not be empty".into(),
    })
    .into();
    let drift: anyhow::Error = NodeDnsError::from(DriftError::InconsistentSpec {
        side: SpecSide::Desired,
        reason: "duplicate container name 'dns'".into(),
    })
    .into();

    assert_eq!(error_type(&synthesis), "InvalidInput");
    assert_eq!(error_type(&drift), "InconsistentSpec");
    assert_eq!(error_type(&anyhow::anyhow!("connection reset")), "unknown");
}

#[test]
fn test_error_type_of_failed_synthesis() {
    // Mirrors the conversion done on the reconcile path
    let mut inputs = create_test_inputs();
    inputs.cluster_service_ip = "10.0.0".into();
    let err: anyhow::Error = build_dns_daemonset(&WorkloadIdentity::default(), &inputs)
        .map_err(NodeDnsError::from)
        .unwrap_err()
        .into();

    assert_eq!(error_type(&err), "InvalidInput");
    assert!(!err.downcast_ref::<NodeDnsError>().unwrap().is_transient());
}

#[test]
fn test_next_action_waits_for_changes() {
    for outcome in [
        DaemonSetOutcome::Created,
        DaemonSetOutcome::Updated,
        DaemonSetOutcome::Recreated,
        DaemonSetOutcome::Unchanged,
    ] {
        assert_eq!(next_action(outcome), Action::await_change(), "{outcome:?}");
    }
}

#[test]
fn test_next_action_requeues_terminating() {
    assert_eq!(
        next_action(DaemonSetOutcome::Terminating),
        Action::requeue(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS))
    );
}
