// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Offline rendering and drift checks for the `render` and `check` subcommands.
//!
//! Neither needs cluster access: `render` prints the synthesized `DaemonSet`, and
//! `check` compares a `DaemonSet` exported with `kubectl get -o yaml` (or JSON)
//! against it.

use crate::config::{OutputFormat, SynthesisInputs, WorkloadIdentity};
use crate::dns_daemonset::build_dns_daemonset;
use crate::drift::{detect_drift, DriftReport, FieldDifference};
use anyhow::{Context as _, Result};
use k8s_openapi::api::apps::v1::DaemonSet;
use serde::Serialize;
use std::path::Path;

/// Report printed by `check`, as a single document.
///
/// `corrected` is only present when the live object drifted.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckSummary<'a> {
    pub changed: bool,
    pub requires_recreate: bool,
    pub differences: &'a [FieldDifference],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected: Option<&'a DaemonSet>,
}

impl<'a> From<&'a DriftReport> for CheckSummary<'a> {
    fn from(report: &'a DriftReport) -> Self {
        Self {
            changed: report.changed,
            requires_recreate: report.requires_recreate,
            differences: &report.differences,
            corrected: report.changed.then_some(&report.corrected),
        }
    }
}

/// Serialize a `DaemonSet` in the requested format.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_output(daemonset: &DaemonSet, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => Ok(serde_yaml::to_string(daemonset)?),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(daemonset)? + "\n"),
    }
}

/// Serialize the outcome of a drift check in the requested format.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn format_check_report(report: &DriftReport, format: OutputFormat) -> Result<String> {
    let summary = CheckSummary::from(report);
    match format {
        OutputFormat::Yaml => Ok(serde_yaml::to_string(&summary)?),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&summary)? + "\n"),
    }
}

/// Render the synthesized `DaemonSet`.
///
/// # Errors
///
/// Returns an error if the inputs are invalid or serialization fails.
pub fn render_daemonset(
    identity: &WorkloadIdentity,
    inputs: &SynthesisInputs,
    format: OutputFormat,
) -> Result<String> {
    let desired = build_dns_daemonset(identity, inputs)?;
    to_output(&desired, format)
}

/// Read a live `DaemonSet` from a YAML or JSON file.
///
/// JSON is a subset of YAML, so one parser covers both.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a `DaemonSet`.
pub fn read_daemonset(path: &Path) -> Result<DaemonSet> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse DaemonSet from {}", path.display()))
}

/// Compare the `DaemonSet` in `path` against the synthesized one.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the inputs are invalid, or either
/// object has duplicate container names.
pub fn check_daemonset(
    path: &Path,
    identity: &WorkloadIdentity,
    inputs: &SynthesisInputs,
) -> Result<DriftReport> {
    let current = read_daemonset(path)?;
    let desired = build_dns_daemonset(identity, inputs)?;
    Ok(detect_drift(&current, &desired)?)
}
