// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the nodedns operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Workload Identity Defaults
// ============================================================================

/// Default name of the DNS `DaemonSet` (also used for its Corefile `ConfigMap`)
pub const DEFAULT_DAEMONSET_NAME: &str = "dns-default";

/// Default namespace the DNS `DaemonSet` lives in
pub const DEFAULT_NAMESPACE: &str = "dns-system";

/// Kind name for the managed workload
pub const KIND_DAEMONSET: &str = "DaemonSet";

/// Field manager name used for API writes
pub const FIELD_MANAGER: &str = "nodedns-controller";

// ============================================================================
// Container Names
// ============================================================================

/// Name of the DNS cache/resolver (agent) container
pub const CONTAINER_NAME_DNS: &str = "dns";

/// Name of the node resolver (tooling) container
pub const CONTAINER_NAME_NODE_RESOLVER: &str = "dns-node-resolver";

// ============================================================================
// Environment Variables
// ============================================================================

/// Cluster DNS service IP injected into the node resolver container
pub const ENV_NAMESERVER: &str = "NAMESERVER";

/// Cluster DNS domain injected into the node resolver container
pub const ENV_CLUSTER_DOMAIN: &str = "CLUSTER_DOMAIN";

/// Path of the host resolver file as seen from inside the node resolver container
pub const ENV_RESOLV_CONF: &str = "RESOLV_CONF";

// ============================================================================
// DNS Agent Constants
// ============================================================================

/// Port the DNS agent listens on inside the pod
pub const DNS_CONTAINER_PORT: u16 = 5353;

/// Prometheus port of the DNS agent
pub const DNS_METRICS_PORT: u16 = 9153;

/// Health endpoint port of the DNS agent
pub const DNS_HEALTH_PORT: u16 = 8080;

/// Health endpoint path of the DNS agent
pub const DNS_HEALTH_PATH: &str = "/health";

/// Directory the Corefile `ConfigMap` is mounted at
pub const COREFILE_DIR: &str = "/etc/coredns";

/// Full path of the Corefile inside the agent container
pub const COREFILE_PATH: &str = "/etc/coredns/Corefile";

/// CPU request of the DNS agent
pub const DNS_CPU_REQUEST: &str = "100m";

/// Memory request of the DNS agent
pub const DNS_MEMORY_REQUEST: &str = "70Mi";

/// CPU request of the node resolver
pub const NODE_RESOLVER_CPU_REQUEST: &str = "5m";

/// Memory request of the node resolver
pub const NODE_RESOLVER_MEMORY_REQUEST: &str = "21Mi";

// ============================================================================
// Kubernetes Health Check Constants
// ============================================================================

/// Readiness probe initial delay
pub const READINESS_INITIAL_DELAY_SECS: i32 = 10;

/// Readiness probe period
pub const READINESS_PERIOD_SECS: i32 = 3;

/// Readiness probe timeout
pub const READINESS_TIMEOUT_SECS: i32 = 3;

/// Readiness probe failure threshold
pub const READINESS_FAILURE_THRESHOLD: i32 = 3;

// ============================================================================
// Node Resolver Constants
// ============================================================================

/// Host directory mounted into the node resolver
pub const HOST_ETC_PATH: &str = "/etc";

/// Mount point of the host `/etc` inside the node resolver
pub const HOST_ETC_MOUNT_PATH: &str = "/host/etc";

/// Host resolver file rewritten by the node resolver
pub const HOST_RESOLV_CONF_PATH: &str = "/host/etc/resolv.conf";

/// Seconds the node resolver sleeps between checks
pub const NODE_RESOLVER_INTERVAL_SECS: u32 = 60;

// ============================================================================
// Pod Scheduling Constants
// ============================================================================

/// Node label key restricting the workload to Linux nodes
pub const NODE_SELECTOR_OS_KEY: &str = "kubernetes.io/os";

/// Node label value restricting the workload to Linux nodes
pub const NODE_SELECTOR_OS_VALUE: &str = "linux";

/// Priority class keeping DNS pods scheduled under node pressure
pub const PRIORITY_CLASS_NAME: &str = "system-node-critical";

/// `ServiceAccount` name for DNS pods
pub const DNS_SERVICE_ACCOUNT: &str = "dns";

/// Pod DNS policy (use the node's upstream resolvers, not the cluster service)
pub const DNS_POLICY: &str = "Default";

/// Rolling update `maxUnavailable` for the `DaemonSet`
pub const ROLLING_UPDATE_MAX_UNAVAILABLE: &str = "10%";

/// Grace period for DNS pods
pub const TERMINATION_GRACE_PERIOD_SECS: i64 = 30;

// ============================================================================
// Controller Error Handling Constants
// ============================================================================

/// Requeue duration for controller errors (30 seconds)
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

/// Default periodic resync of the `DaemonSet` (5 minutes)
pub const DEFAULT_RESYNC_SECS: u64 = 300;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 2;

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Port for Prometheus metrics HTTP server
pub const METRICS_SERVER_PORT: u16 = 8080;

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Bind address for metrics HTTP server
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0";
