// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubernetes reconciliation for the per-node DNS workload.
//!
//! The controller follows the standard Kubernetes pattern:
//!
//! 1. **Watch** - Monitor the managed `DaemonSet` via the Kubernetes API
//! 2. **Reconcile** - Compare the synthesized `DaemonSet` with the live one
//! 3. **Update** - Write the corrected object back when managed fields drifted
//!
//! # Example: Running One Pass
//!
//! ```rust,no_run
//! use nodedns::config::{SynthesisInputs, WorkloadIdentity};
//! use nodedns::reconcilers::ensure_dns_daemonset;
//! use k8s_openapi::api::apps::v1::DaemonSet;
//! use kube::{Api, Client};
//!
//! async fn ensure(client: Client, inputs: SynthesisInputs) -> anyhow::Result<()> {
//!     let identity = WorkloadIdentity::default();
//!     let api: Api<DaemonSet> = Api::namespaced(client, &identity.namespace);
//!
//!     let outcome = ensure_dns_daemonset(&api, &identity, &inputs).await?;
//!     println!("DaemonSet {}", outcome.as_str());
//!     Ok(())
//! }
//! ```

pub mod daemonset;

pub use daemonset::{
    ensure_dns_daemonset, error_policy, next_action, plan_daemonset, reconcile_dns_daemonset,
    reconcile_once, DaemonSetOutcome, DaemonSetPlan,
};

/// Error returned to the controller runtime.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ReconcileError(#[from] pub anyhow::Error);
