// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation of the per-node DNS `DaemonSet`.
//!
//! Each pass synthesizes the desired `DaemonSet`, reads the live one, and writes
//! at most one correction:
//!
//! - missing → create the desired object
//! - drifted → replace with the corrected object (keeps the live resource version,
//!   so a concurrent writer turns into a conflict and a requeue)
//! - selector drifted → delete and create, since the selector is immutable
//! - terminating → wait for the deletion to finish
//!
//! Retries are left to the controller's error policy.

use super::ReconcileError;
use crate::config::{SynthesisInputs, WorkloadIdentity};
use crate::constants::{ERROR_REQUEUE_DURATION_SECS, FIELD_MANAGER, KIND_DAEMONSET};
use crate::context::Context;
use crate::dns_daemonset::build_dns_daemonset;
use crate::drift::{detect_drift, FieldDifference};
use crate::errors::{DriftError, NodeDnsError};
use crate::metrics;
use anyhow::Result;
use k8s_openapi::api::apps::v1::DaemonSet;
use kube::api::{DeleteParams, PostParams};
use kube::runtime::controller::Action;
use kube::Api;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// What a reconciliation pass has to write.
#[derive(Debug, Clone, PartialEq)]
pub enum DaemonSetPlan {
    /// No live object exists
    Create(DaemonSet),
    /// Managed fields drifted and can be corrected in place
    Update {
        corrected: DaemonSet,
        differences: Vec<FieldDifference>,
    },
    /// An immutable managed field drifted
    Recreate {
        desired: DaemonSet,
        differences: Vec<FieldDifference>,
    },
    /// The live object is being deleted
    WaitForDeletion,
    /// Every managed field matches
    Unchanged,
}

/// What a reconciliation pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonSetOutcome {
    Created,
    Updated,
    Recreated,
    Terminating,
    Unchanged,
}

impl DaemonSetOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Recreated => "recreated",
            Self::Terminating => "terminating",
            Self::Unchanged => "unchanged",
        }
    }
}

/// Decides how to bring the live `DaemonSet` in line with `desired`.
///
/// # Errors
///
/// Returns [`DriftError::InconsistentSpec`] if either object has duplicate
/// container names.
pub fn plan_daemonset(
    current: Option<&DaemonSet>,
    desired: DaemonSet,
) -> Result<DaemonSetPlan, DriftError> {
    let Some(current) = current else {
        return Ok(DaemonSetPlan::Create(desired));
    };

    if current.metadata.deletion_timestamp.is_some() {
        return Ok(DaemonSetPlan::WaitForDeletion);
    }

    let report = detect_drift(current, &desired)?;
    if !report.changed {
        return Ok(DaemonSetPlan::Unchanged);
    }

    if report.requires_recreate {
        Ok(DaemonSetPlan::Recreate {
            desired,
            differences: report.differences,
        })
    } else {
        Ok(DaemonSetPlan::Update {
            corrected: report.corrected,
            differences: report.differences,
        })
    }
}

/// Joins differences for a single log line.
#[must_use]
pub fn summarize_differences(differences: &[FieldDifference]) -> String {
    differences
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Create or correct the DNS `DaemonSet`.
///
/// # Errors
///
/// Returns an error if synthesis fails, either object is inconsistent, or an API
/// call fails.
pub async fn ensure_dns_daemonset(
    api: &Api<DaemonSet>,
    identity: &WorkloadIdentity,
    inputs: &SynthesisInputs,
) -> Result<DaemonSetOutcome> {
    let desired = build_dns_daemonset(identity, inputs).map_err(NodeDnsError::from)?;
    let current = api.get_opt(&identity.name).await?;
    let plan = plan_daemonset(current.as_ref(), desired).map_err(NodeDnsError::from)?;

    let params = PostParams {
        field_manager: Some(FIELD_MANAGER.into()),
        ..Default::default()
    };
    let namespace = identity.namespace.as_str();
    let name = identity.name.as_str();

    match plan {
        DaemonSetPlan::Create(desired) => {
            info!("Creating DaemonSet {}/{}", namespace, name);
            api.create(&params, &desired).await?;
            metrics::record_resource_write(KIND_DAEMONSET, "create");
            Ok(DaemonSetOutcome::Created)
        }
        DaemonSetPlan::Update {
            corrected,
            differences,
        } => {
            info!(
                drifted = %summarize_differences(&differences),
                "DaemonSet {}/{} drifted, updating", namespace, name
            );
            for difference in &differences {
                metrics::record_drift(difference.path);
            }
            api.replace(name, &params, &corrected).await?;
            metrics::record_resource_write(KIND_DAEMONSET, "update");
            Ok(DaemonSetOutcome::Updated)
        }
        DaemonSetPlan::Recreate {
            desired,
            differences,
        } => {
            warn!(
                drifted = %summarize_differences(&differences),
                "DaemonSet {}/{} selector drifted, recreating", namespace, name
            );
            for difference in &differences {
                metrics::record_drift(difference.path);
            }
            api.delete(name, &DeleteParams::background()).await?;
            api.create(&params, &desired).await?;
            metrics::record_resource_write(KIND_DAEMONSET, "recreate");
            Ok(DaemonSetOutcome::Recreated)
        }
        DaemonSetPlan::WaitForDeletion => {
            info!("DaemonSet {}/{} is terminating, waiting", namespace, name);
            Ok(DaemonSetOutcome::Terminating)
        }
        DaemonSetPlan::Unchanged => {
            debug!("DaemonSet {}/{} is up to date", namespace, name);
            Ok(DaemonSetOutcome::Unchanged)
        }
    }
}

/// Category of a reconciliation error, used as a metrics label.
#[must_use]
pub fn error_type(err: &anyhow::Error) -> &'static str {
    if let Some(core) = err.downcast_ref::<NodeDnsError>() {
        core.reason()
    } else if err.downcast_ref::<kube::Error>().is_some() {
        "api_error"
    } else {
        "unknown"
    }
}

/// Run one reconciliation pass; used by the controller, the startup pass and the
/// resync loop.
///
/// # Errors
///
/// Returns the error of [`ensure_dns_daemonset`] after recording it.
pub async fn reconcile_once(ctx: &Context) -> Result<DaemonSetOutcome> {
    let start = Instant::now();
    let api: Api<DaemonSet> = Api::namespaced(ctx.client.clone(), &ctx.identity.namespace);

    match ensure_dns_daemonset(&api, &ctx.identity, &ctx.inputs).await {
        Ok(outcome) => {
            metrics::record_reconciliation_success(KIND_DAEMONSET, start.elapsed());
            debug!(outcome = outcome.as_str(), "Reconciliation finished");
            Ok(outcome)
        }
        Err(e) => {
            metrics::record_reconciliation_error(KIND_DAEMONSET, start.elapsed());
            metrics::record_error(KIND_DAEMONSET, error_type(&e));
            Err(e)
        }
    }
}

/// What the controller does after a successful pass.
///
/// Periodic resyncs run outside the controller, so only a terminating object is
/// requeued here.
#[must_use]
pub fn next_action(outcome: DaemonSetOutcome) -> Action {
    match outcome {
        DaemonSetOutcome::Terminating => {
            Action::requeue(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS))
        }
        DaemonSetOutcome::Created
        | DaemonSetOutcome::Updated
        | DaemonSetOutcome::Recreated
        | DaemonSetOutcome::Unchanged => Action::await_change(),
    }
}

/// Controller entry point. The watched object only triggers the pass; the live
/// object is always re-read.
///
/// # Errors
///
/// Returns a [`ReconcileError`] wrapping any failure of [`reconcile_once`].
pub async fn reconcile_dns_daemonset(
    _daemonset: Arc<DaemonSet>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let outcome = reconcile_once(&ctx).await?;
    Ok(next_action(outcome))
}

/// Requeue after a fixed delay; no backoff.
pub fn error_policy(_daemonset: Arc<DaemonSet>, err: &ReconcileError, ctx: Arc<Context>) -> Action {
    error!(
        "Reconciliation of DaemonSet {}/{} failed: {:#}",
        ctx.identity.namespace, ctx.identity.name, err.0
    );
    Action::requeue(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS))
}

#[cfg(test)]
#[path = "daemonset_tests.rs"]
mod daemonset_tests;
