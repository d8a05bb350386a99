// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Drift detection between the live DNS `DaemonSet` and the synthesized one.
//!
//! Only the fields in [`crate::managed_fields`] are compared. Containers are joined
//! on `name`, never on position. The corrected object starts as a copy of the live
//! one (keeping its UID, resource version, status and anything else the controller
//! does not own) with each drifted managed field overwritten from the desired one.
//!
//! Detection is a fixed point: running it again on the corrected object against the
//! same desired object always reports no drift.

use crate::errors::{DriftError, SpecSide};
use crate::managed_fields::{
    pod_spec, pod_spec_mut, CONTAINER_FIELDS, CONTAINER_SET, WORKLOAD_FIELDS,
};
use k8s_openapi::api::apps::v1::{DaemonSet, DaemonSetSpec};
use k8s_openapi::api::core::v1::Container;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// How a managed field differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DifferenceKind {
    /// Present on both sides with different values
    Modified,
    /// Container present only in the desired object
    Added,
    /// Container present only in the live object
    Removed,
}

/// One managed field that has drifted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDifference {
    /// Managed field path, relative to the container for container fields
    pub path: &'static str,
    /// Container the difference belongs to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    pub kind: DifferenceKind,
}

impl fmt::Display for FieldDifference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            DifferenceKind::Modified => "modified",
            DifferenceKind::Added => "added",
            DifferenceKind::Removed => "removed",
        };
        match &self.container {
            Some(container) if self.path == CONTAINER_SET.path => {
                write!(f, "{}[{container}] {kind}", self.path)
            }
            Some(container) => write!(f, "containers[{container}].{} {kind}", self.path),
            None => write!(f, "{} {kind}", self.path),
        }
    }
}

/// Result of comparing a live `DaemonSet` against the desired one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftReport {
    /// True iff at least one managed field differs
    pub changed: bool,
    /// The live object with every managed field taken from the desired object.
    /// Equal to the live object when nothing changed.
    pub corrected: DaemonSet,
    /// Every drifted managed field, in comparison order
    pub differences: Vec<FieldDifference>,
    /// A drifted field cannot be updated in place (e.g. the selector)
    pub requires_recreate: bool,
}

impl DriftReport {
    /// Splits the report into `(changed, corrected)`.
    #[must_use]
    pub fn into_parts(self) -> (bool, DaemonSet) {
        (self.changed, self.corrected)
    }
}

/// Compares the managed fields of `current` against `desired`.
///
/// # Arguments
///
/// * `current` - The live `DaemonSet`; never modified
/// * `desired` - The synthesized `DaemonSet`
///
/// # Returns
///
/// A [`DriftReport`] whose `corrected` object is a fixed point:
/// `detect_drift(&report.corrected, desired)` reports `changed == false`.
///
/// # Errors
///
/// Returns [`DriftError::InconsistentSpec`] if either object lists two containers
/// with the same name.
pub fn detect_drift(current: &DaemonSet, desired: &DaemonSet) -> Result<DriftReport, DriftError> {
    let empty = DaemonSetSpec::default();
    let current_spec = current.spec.as_ref().unwrap_or(&empty);
    let desired_spec = desired.spec.as_ref().unwrap_or(&empty);

    let current_containers = containers(current_spec);
    let desired_containers = containers(desired_spec);
    let current_by_name = index_by_name(current_containers, SpecSide::Current)?;
    let desired_by_name = index_by_name(desired_containers, SpecSide::Desired)?;

    let mut corrected = current.clone();
    let corrected_spec = corrected.spec.get_or_insert_with(DaemonSetSpec::default);
    let mut differences = Vec::new();
    let mut requires_recreate = false;

    for field in WORKLOAD_FIELDS {
        if field.differs(current_spec, desired_spec) {
            debug!(path = field.path, rule = ?field.rule, "Managed field drifted");
            field.overwrite(corrected_spec, desired_spec);
            requires_recreate |= field.requires_recreate;
            differences.push(FieldDifference {
                path: field.path,
                container: None,
                kind: DifferenceKind::Modified,
            });
        }
    }

    let membership_differs = record_membership(
        current_containers,
        desired_containers,
        &current_by_name,
        &desired_by_name,
        &mut differences,
    );

    // Matched containers, patched field by field, in desired order
    let mut patched: BTreeMap<&str, Container> = BTreeMap::new();
    for desired_container in desired_containers {
        let name = desired_container.name.as_str();
        let Some(current_container) = current_by_name.get(name) else {
            continue;
        };
        let mut container = (*current_container).clone();
        for field in CONTAINER_FIELDS {
            if field.differs(current_container, desired_container) {
                debug!(container = name, path = field.path, "Managed container field drifted");
                field.overwrite(&mut container, desired_container);
                differences.push(FieldDifference {
                    path: field.path,
                    container: Some(name.to_string()),
                    kind: DifferenceKind::Modified,
                });
            }
        }
        patched.insert(name, container);
    }

    if differences.is_empty() {
        return Ok(DriftReport {
            changed: false,
            corrected: current.clone(),
            differences,
            requires_recreate: false,
        });
    }

    let corrected_containers: Vec<Container> = if membership_differs {
        desired_containers
            .iter()
            .map(|d| {
                patched
                    .remove(d.name.as_str())
                    .unwrap_or_else(|| d.clone())
            })
            .collect()
    } else {
        current_containers
            .iter()
            .filter_map(|c| patched.remove(c.name.as_str()))
            .collect()
    };
    pod_spec_mut(corrected_spec).containers = corrected_containers;

    Ok(DriftReport {
        changed: true,
        corrected,
        differences,
        requires_recreate,
    })
}

fn containers(spec: &DaemonSetSpec) -> &[Container] {
    match pod_spec(spec) {
        Some(pod) => &pod.containers,
        None => &[],
    }
}

fn index_by_name(
    containers: &[Container],
    side: SpecSide,
) -> Result<BTreeMap<&str, &Container>, DriftError> {
    let mut index = BTreeMap::new();
    for container in containers {
        if index.insert(container.name.as_str(), container).is_some() {
            return Err(DriftError::InconsistentSpec {
                side,
                reason: format!("duplicate container name '{}'", container.name),
            });
        }
    }
    Ok(index)
}

/// Records removed then added containers. Returns true if membership differs.
fn record_membership(
    current: &[Container],
    desired: &[Container],
    current_by_name: &BTreeMap<&str, &Container>,
    desired_by_name: &BTreeMap<&str, &Container>,
    differences: &mut Vec<FieldDifference>,
) -> bool {
    let before = differences.len();

    for container in current {
        if !desired_by_name.contains_key(container.name.as_str()) {
            debug!(container = %container.name, "Unmanaged container present");
            differences.push(FieldDifference {
                path: CONTAINER_SET.path,
                container: Some(container.name.clone()),
                kind: DifferenceKind::Removed,
            });
        }
    }
    for container in desired {
        if !current_by_name.contains_key(container.name.as_str()) {
            debug!(container = %container.name, "Managed container missing");
            differences.push(FieldDifference {
                path: CONTAINER_SET.path,
                container: Some(container.name.clone()),
                kind: DifferenceKind::Added,
            });
        }
    }

    differences.len() != before
}

#[cfg(test)]
#[path = "drift_tests.rs"]
mod drift_tests;
