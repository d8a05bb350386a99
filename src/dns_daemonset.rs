// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Desired-state builder for the per-node DNS `DaemonSet`.
//!
//! [`build_dns_daemonset`] maps the cluster DNS service IP, the cluster domain and
//! two image references to the canonical `DaemonSet`. It is a pure function: the
//! same inputs always produce the same object, which is what lets the drift
//! detector converge instead of flapping.
//!
//! The pod runs two containers, in this order:
//!
//! 1. `dns` - the DNS cache/resolver, configured from the Corefile `ConfigMap`
//! 2. `dns-node-resolver` - keeps the node's resolver file pointed at the cluster
//!    DNS service (`NAMESERVER`) and domain (`CLUSTER_DOMAIN`)

use crate::config::{SynthesisInputs, WorkloadIdentity};
use crate::constants::{
    CONTAINER_NAME_DNS, CONTAINER_NAME_NODE_RESOLVER, COREFILE_DIR, COREFILE_PATH,
    DNS_CONTAINER_PORT, DNS_CPU_REQUEST, DNS_HEALTH_PATH, DNS_HEALTH_PORT, DNS_MEMORY_REQUEST,
    DNS_METRICS_PORT, DNS_POLICY, DNS_SERVICE_ACCOUNT, ENV_CLUSTER_DOMAIN, ENV_NAMESERVER,
    ENV_RESOLV_CONF, HOST_ETC_MOUNT_PATH, HOST_ETC_PATH, HOST_RESOLV_CONF_PATH,
    NODE_RESOLVER_CPU_REQUEST, NODE_RESOLVER_INTERVAL_SECS, NODE_RESOLVER_MEMORY_REQUEST,
    NODE_SELECTOR_OS_KEY, NODE_SELECTOR_OS_VALUE, PRIORITY_CLASS_NAME,
    READINESS_FAILURE_THRESHOLD, READINESS_INITIAL_DELAY_SECS, READINESS_PERIOD_SECS,
    READINESS_TIMEOUT_SECS, ROLLING_UPDATE_MAX_UNAVAILABLE, TERMINATION_GRACE_PERIOD_SECS,
};
use crate::errors::SynthesisError;
use crate::labels::{
    APP_NAME_DNS, COMPONENT_NODE_DNS, DAEMONSET_BINDING_LABEL, K8S_COMPONENT, K8S_INSTANCE,
    K8S_MANAGED_BY, K8S_NAME, K8S_PART_OF, MANAGED_BY_NODEDNS, PART_OF_NODEDNS,
};
use k8s_openapi::api::{
    apps::v1::{DaemonSet, DaemonSetSpec, DaemonSetUpdateStrategy, RollingUpdateDaemonSet},
    core::v1::{
        ConfigMapVolumeSource, Container, ContainerPort, EnvVar, HTTPGetAction,
        HostPathVolumeSource, KeyToPath, PodSpec, PodTemplateSpec, Probe, ResourceRequirements,
        SecurityContext, Toleration, Volume, VolumeMount,
    },
};
use k8s_openapi::apimachinery::pkg::{
    api::resource::Quantity,
    apis::meta::v1::{LabelSelector, ObjectMeta},
    util::intstr::IntOrString,
};
use std::collections::BTreeMap;
use std::net::IpAddr;
use tracing::debug;

// Embed the node resolver script at compile time
const NODE_RESOLVER_SCRIPT_TEMPLATE: &str = include_str!("../templates/node-resolver.sh.tmpl");

// Corefile key in the ConfigMap
const COREFILE_KEY: &str = "Corefile";

// Volume names
const VOLUME_CONFIG: &str = "config-volume";
const VOLUME_HOST_ETC: &str = "host-etc";

/// Builds the selector-binding labels for a `DaemonSet`.
///
/// This is the full `spec.selector.matchLabels` value. It must never change for
/// an existing `DaemonSet`, so it carries only the workload name.
#[must_use]
pub fn build_selector_labels(identity: &WorkloadIdentity) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(DAEMONSET_BINDING_LABEL.into(), identity.name.clone());
    labels
}

/// Builds the labels set on the `DaemonSet` and its pod template.
///
/// A superset of [`build_selector_labels`].
#[must_use]
pub fn build_labels(identity: &WorkloadIdentity) -> BTreeMap<String, String> {
    let mut labels = build_selector_labels(identity);
    labels.insert(K8S_NAME.into(), APP_NAME_DNS.into());
    labels.insert(K8S_INSTANCE.into(), identity.name.clone());
    labels.insert(K8S_COMPONENT.into(), COMPONENT_NODE_DNS.into());
    labels.insert(K8S_MANAGED_BY.into(), MANAGED_BY_NODEDNS.into());
    labels.insert(K8S_PART_OF.into(), PART_OF_NODEDNS.into());
    labels
}

/// Checks every synthesis input, in argument order.
///
/// # Errors
///
/// Returns [`SynthesisError::InvalidInput`] naming the first bad input.
pub fn validate_inputs(inputs: &SynthesisInputs) -> Result<(), SynthesisError> {
    if inputs.cluster_service_ip.parse::<IpAddr>().is_err() {
        return Err(SynthesisError::InvalidInput {
            field: "cluster_service_ip",
            reason: format!(
                "'{}' is not a valid IP address",
                inputs.cluster_service_ip
            ),
        });
    }
    require_non_empty("cluster_domain", &inputs.cluster_domain)?;
    require_non_empty("agent_image", &inputs.agent_image)?;
    require_non_empty("tooling_image", &inputs.tooling_image)?;
    Ok(())
}

fn require_non_empty(field: &'static str, value: &str) -> Result<(), SynthesisError> {
    if value.trim().is_empty() {
        return Err(SynthesisError::InvalidInput {
            field,
            reason: "must not be empty".into(),
        });
    }
    Ok(())
}

/// Builds the desired DNS `DaemonSet`.
///
/// # Arguments
///
/// * `identity` - Name and namespace of the `DaemonSet`
/// * `inputs` - Cluster DNS service IP, cluster domain and container images
///
/// # Returns
///
/// The canonical `DaemonSet`. Calling this twice with equal arguments returns equal
/// objects.
///
/// # Errors
///
/// Returns [`SynthesisError::InvalidInput`] if the service IP does not parse or the
/// domain or either image is empty.
pub fn build_dns_daemonset(
    identity: &WorkloadIdentity,
    inputs: &SynthesisInputs,
) -> Result<DaemonSet, SynthesisError> {
    validate_inputs(inputs)?;

    debug!(
        name = %identity.name,
        namespace = %identity.namespace,
        cluster_service_ip = %inputs.cluster_service_ip,
        cluster_domain = %inputs.cluster_domain,
        "Building DNS DaemonSet"
    );

    let labels = build_labels(identity);

    Ok(DaemonSet {
        metadata: ObjectMeta {
            name: Some(identity.name.clone()),
            namespace: Some(identity.namespace.clone()),
            labels: Some(labels.clone()),
            ..Default::default()
        },
        spec: Some(DaemonSetSpec {
            selector: LabelSelector {
                match_labels: Some(build_selector_labels(identity)),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(build_pod_spec(identity, inputs)),
            },
            update_strategy: Some(DaemonSetUpdateStrategy {
                type_: Some("RollingUpdate".into()),
                rolling_update: Some(RollingUpdateDaemonSet {
                    max_unavailable: Some(IntOrString::String(
                        ROLLING_UPDATE_MAX_UNAVAILABLE.into(),
                    )),
                    ..Default::default()
                }),
            }),
            ..Default::default()
        }),
        ..Default::default()
    })
}

/// Builds the pod spec with the DNS agent and the node resolver.
fn build_pod_spec(identity: &WorkloadIdentity, inputs: &SynthesisInputs) -> PodSpec {
    let mut node_selector = BTreeMap::new();
    node_selector.insert(NODE_SELECTOR_OS_KEY.into(), NODE_SELECTOR_OS_VALUE.into());

    PodSpec {
        containers: vec![
            build_dns_container(&inputs.agent_image),
            build_node_resolver_container(inputs),
        ],
        node_selector: Some(node_selector),
        // DNS must run on every node, tainted or not
        tolerations: Some(vec![Toleration {
            operator: Some("Exists".into()),
            ..Default::default()
        }]),
        dns_policy: Some(DNS_POLICY.into()),
        priority_class_name: Some(PRIORITY_CLASS_NAME.into()),
        service_account_name: Some(DNS_SERVICE_ACCOUNT.into()),
        termination_grace_period_seconds: Some(TERMINATION_GRACE_PERIOD_SECS),
        volumes: Some(build_volumes(identity)),
        ..Default::default()
    }
}

/// Build the DNS cache/resolver container
///
/// Its configuration comes entirely from the mounted Corefile; no environment
/// variables are derived from the synthesis inputs.
fn build_dns_container(image: &str) -> Container {
    Container {
        name: CONTAINER_NAME_DNS.into(),
        image: Some(image.into()),
        image_pull_policy: Some("IfNotPresent".into()),
        command: Some(vec!["coredns".into()]),
        args: Some(vec!["-conf".into(), COREFILE_PATH.into()]),
        ports: Some(vec![
            ContainerPort {
                name: Some("dns".into()),
                container_port: i32::from(DNS_CONTAINER_PORT),
                protocol: Some("UDP".into()),
                ..Default::default()
            },
            ContainerPort {
                name: Some("dns-tcp".into()),
                container_port: i32::from(DNS_CONTAINER_PORT),
                protocol: Some("TCP".into()),
                ..Default::default()
            },
            ContainerPort {
                name: Some("metrics".into()),
                container_port: i32::from(DNS_METRICS_PORT),
                protocol: Some("TCP".into()),
                ..Default::default()
            },
        ]),
        volume_mounts: Some(vec![VolumeMount {
            name: VOLUME_CONFIG.into(),
            mount_path: COREFILE_DIR.into(),
            read_only: Some(true),
            ..Default::default()
        }]),
        readiness_probe: Some(Probe {
            http_get: Some(HTTPGetAction {
                path: Some(DNS_HEALTH_PATH.into()),
                port: IntOrString::Int(i32::from(DNS_HEALTH_PORT)),
                scheme: Some("HTTP".into()),
                ..Default::default()
            }),
            initial_delay_seconds: Some(READINESS_INITIAL_DELAY_SECS),
            period_seconds: Some(READINESS_PERIOD_SECS),
            timeout_seconds: Some(READINESS_TIMEOUT_SECS),
            failure_threshold: Some(READINESS_FAILURE_THRESHOLD),
            ..Default::default()
        }),
        resources: Some(build_requests(DNS_CPU_REQUEST, DNS_MEMORY_REQUEST)),
        termination_message_policy: Some("FallbackToLogsOnError".into()),
        ..Default::default()
    }
}

/// Build the node resolver container
///
/// The environment is emitted in a fixed order: `NAMESERVER`, `CLUSTER_DOMAIN`,
/// `RESOLV_CONF`.
fn build_node_resolver_container(inputs: &SynthesisInputs) -> Container {
    let script = NODE_RESOLVER_SCRIPT_TEMPLATE
        .replace("{{INTERVAL_SECS}}", &NODE_RESOLVER_INTERVAL_SECS.to_string());

    Container {
        name: CONTAINER_NAME_NODE_RESOLVER.into(),
        image: Some(inputs.tooling_image.clone()),
        image_pull_policy: Some("IfNotPresent".into()),
        command: Some(vec!["/bin/bash".into(), "-c".into(), script]),
        env: Some(vec![
            EnvVar {
                name: ENV_NAMESERVER.into(),
                value: Some(inputs.cluster_service_ip.clone()),
                ..Default::default()
            },
            EnvVar {
                name: ENV_CLUSTER_DOMAIN.into(),
                value: Some(inputs.cluster_domain.clone()),
                ..Default::default()
            },
            EnvVar {
                name: ENV_RESOLV_CONF.into(),
                value: Some(HOST_RESOLV_CONF_PATH.into()),
                ..Default::default()
            },
        ]),
        volume_mounts: Some(vec![VolumeMount {
            name: VOLUME_HOST_ETC.into(),
            mount_path: HOST_ETC_MOUNT_PATH.into(),
            ..Default::default()
        }]),
        // Writes the host's resolver file
        security_context: Some(SecurityContext {
            privileged: Some(true),
            ..Default::default()
        }),
        resources: Some(build_requests(
            NODE_RESOLVER_CPU_REQUEST,
            NODE_RESOLVER_MEMORY_REQUEST,
        )),
        termination_message_policy: Some("FallbackToLogsOnError".into()),
        ..Default::default()
    }
}

fn build_requests(cpu: &str, memory: &str) -> ResourceRequirements {
    let mut requests = BTreeMap::new();
    requests.insert("cpu".to_string(), Quantity(cpu.into()));
    requests.insert("memory".to_string(), Quantity(memory.into()));
    ResourceRequirements {
        requests: Some(requests),
        ..Default::default()
    }
}

fn build_volumes(identity: &WorkloadIdentity) -> Vec<Volume> {
    vec![
        Volume {
            name: VOLUME_CONFIG.into(),
            config_map: Some(ConfigMapVolumeSource {
                name: identity.name.clone(),
                items: Some(vec![KeyToPath {
                    key: COREFILE_KEY.into(),
                    path: COREFILE_KEY.into(),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        },
        Volume {
            name: VOLUME_HOST_ETC.into(),
            host_path: Some(HostPathVolumeSource {
                path: HOST_ETC_PATH.into(),
                type_: Some("Directory".into()),
            }),
            ..Default::default()
        },
    ]
}
