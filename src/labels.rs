// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common label constants used on every object the controller synthesizes.

// ============================================================================
// Kubernetes Standard Labels
// https://kubernetes.io/docs/concepts/overview/working-with-objects/common-labels/
// ============================================================================

/// Standard label for the component name within the architecture
pub const K8S_COMPONENT: &str = "app.kubernetes.io/component";

/// Standard label for the tool being used to manage the operation of an application
pub const K8S_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Standard label for the name of the application
pub const K8S_NAME: &str = "app.kubernetes.io/name";

/// Standard label for a unique name identifying the instance of an application
pub const K8S_INSTANCE: &str = "app.kubernetes.io/instance";

/// Standard label for the name of a higher-level application this one is part of
pub const K8S_PART_OF: &str = "app.kubernetes.io/part-of";

// ============================================================================
// Kubernetes Standard Label Values
// ============================================================================

/// Value for `app.kubernetes.io/part-of`
pub const PART_OF_NODEDNS: &str = "nodedns";

/// Component value for the per-node DNS cache
pub const COMPONENT_NODE_DNS: &str = "node-dns";

/// Application name for the DNS agent
pub const APP_NAME_DNS: &str = "dns";

/// Value for `app.kubernetes.io/managed-by`
pub const MANAGED_BY_NODEDNS: &str = "nodedns-controller";

// ============================================================================
// Selector Binding
// ============================================================================

/// Label binding pods to their `DaemonSet`; the only key in the selector.
///
/// Its value is the `DaemonSet` name. Every key of the selector must also appear on the
/// pod template, otherwise the API server rejects the object.
pub const DAEMONSET_BINDING_LABEL: &str = "dns.nodedns.io/daemonset";
