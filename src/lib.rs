// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # nodedns - Per-node DNS `DaemonSet` operator for Kubernetes
//!
//! nodedns keeps a cluster's per-node DNS cache `DaemonSet` in its desired state.
//!
//! ## Overview
//!
//! Two pure functions do the work, and the controller only wires them to the API:
//!
//! - [`dns_daemonset::build_dns_daemonset`] synthesizes the desired `DaemonSet` from
//!   the cluster DNS service IP, the cluster domain and two container images
//! - [`drift::detect_drift`] compares a live `DaemonSet` against the desired one on
//!   the managed fields only, and returns a corrected object that keeps everything
//!   else the cluster set
//!
//! ## Modules
//!
//! - [`managed_fields`] - The table of fields the operator owns and how each is compared
//! - [`dns_daemonset`] - Desired-state synthesis
//! - [`drift`] - Drift detection and correction
//! - [`reconcilers`] - Create, update or recreate the live object
//! - [`render`] - Offline `render` and `check` subcommands
//! - [`config`] - Inputs and command line
//! - [`metrics`] - Prometheus metrics
//!
//! ## Example
//!
//! ```rust,no_run
//! use nodedns::config::{SynthesisInputs, WorkloadIdentity};
//! use nodedns::dns_daemonset::build_dns_daemonset;
//! use nodedns::drift::detect_drift;
//!
//! let inputs = SynthesisInputs {
//!     cluster_service_ip: "172.30.0.10".to_string(),
//!     cluster_domain: "cluster.local".to_string(),
//!     agent_image: "registry.example.com/coredns:1.11".to_string(),
//!     tooling_image: "registry.example.com/cli:1.0".to_string(),
//! };
//! let desired = build_dns_daemonset(&WorkloadIdentity::default(), &inputs).unwrap();
//!
//! let report = detect_drift(&desired, &desired).unwrap();
//! assert!(!report.changed);
//! ```

pub mod config;
pub mod constants;
pub mod context;
pub mod dns_daemonset;
pub mod drift;
pub mod errors;
pub mod labels;
pub mod managed_fields;
pub mod metrics;
pub mod reconcilers;
pub mod render;

#[cfg(test)]
mod config_tests;
