// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Integration tests for the DNS `DaemonSet` reconciler.
//!
//! These tests need a Kubernetes cluster (kind works) and skip otherwise.
//!
//! Run with: cargo test --test daemonset_integration -- --ignored

mod common;

use common::{cleanup_test_namespace, create_test_namespace, get_kube_client_or_skip, test_inputs};
use k8s_openapi::api::apps::v1::DaemonSet;
use kube::api::{Api, PostParams};
use nodedns::config::WorkloadIdentity;
use nodedns::reconcilers::{ensure_dns_daemonset, DaemonSetOutcome};

const CONVERGE_NAMESPACE: &str = "nodedns-test-converge";
const REVERT_NAMESPACE: &str = "nodedns-test-revert";

#[tokio::test]
#[ignore = "requires a Kubernetes cluster"]
async fn test_ensure_creates_then_converges() {
    let Some(client) = get_kube_client_or_skip().await else {
        return;
    };
    create_test_namespace(&client, CONVERGE_NAMESPACE).await.unwrap();

    let identity = WorkloadIdentity::new("dns-converge", CONVERGE_NAMESPACE);
    let inputs = test_inputs();
    let api: Api<DaemonSet> = Api::namespaced(client.clone(), CONVERGE_NAMESPACE);

    let first = ensure_dns_daemonset(&api, &identity, &inputs).await.unwrap();
    assert_eq!(first, DaemonSetOutcome::Created);

    // Defaults filled in by the API server must not look like drift
    let second = ensure_dns_daemonset(&api, &identity, &inputs).await.unwrap();
    assert_eq!(second, DaemonSetOutcome::Unchanged);

    cleanup_test_namespace(&client, CONVERGE_NAMESPACE).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a Kubernetes cluster"]
async fn test_ensure_reverts_hand_edited_image() {
    let Some(client) = get_kube_client_or_skip().await else {
        return;
    };
    create_test_namespace(&client, REVERT_NAMESPACE).await.unwrap();

    let identity = WorkloadIdentity::new("dns-revert", REVERT_NAMESPACE);
    let inputs = test_inputs();
    let api: Api<DaemonSet> = Api::namespaced(client.clone(), REVERT_NAMESPACE);
    ensure_dns_daemonset(&api, &identity, &inputs).await.unwrap();

    let mut live = api.get(&identity.name).await.unwrap();
    let containers = &mut live
        .spec
        .as_mut()
        .unwrap()
        .template
        .spec
        .as_mut()
        .unwrap()
        .containers;
    containers[0].image = Some("registry.k8s.io/coredns/coredns:v1.10.0".to_string());
    api.replace(&identity.name, &PostParams::default(), &live)
        .await
        .unwrap();

    let outcome = ensure_dns_daemonset(&api, &identity, &inputs).await.unwrap();
    assert_eq!(outcome, DaemonSetOutcome::Updated);

    let corrected = api.get(&identity.name).await.unwrap();
    let image = corrected.spec.unwrap().template.spec.unwrap().containers[0]
        .image
        .clone();
    assert_eq!(image.as_deref(), Some(inputs.agent_image.as_str()));

    cleanup_test_namespace(&client, REVERT_NAMESPACE).await.unwrap();
}
