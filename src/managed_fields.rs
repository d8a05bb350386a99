// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Classification of the `DaemonSet` fields the controller is authoritative over.
//!
//! The synthesizer populates exactly these fields and the drift detector compares
//! and overwrites exactly these fields. Every field not listed here belongs to
//! the API server, other controllers, or operators, and is never touched.
//!
//! Each row carries the comparison rule it implements. All rules treat an absent
//! collection and an empty one as equal, so that the API server dropping an empty
//! list on round-trip never shows up as drift.
//!
//! | Path                                   | Scope     | Rule              |
//! |----------------------------------------|-----------|-------------------|
//! | `spec.selector`                        | workload  | `Mapping`         |
//! | `spec.template.metadata.labels`        | workload  | `LabelSubset`     |
//! | `spec.template.spec.nodeSelector`      | workload  | `Mapping`         |
//! | `spec.template.spec.containers`        | workload  | `NameKeyedSet`    |
//! | `containers[*].image`                  | container | `Scalar`          |
//! | `containers[*].command`                | container | `OrderedSequence` |
//! | `containers[*].args`                   | container | `OrderedSequence` |
//! | `containers[*].env`                    | container | `Mapping`         |

use k8s_openapi::api::apps::v1::DaemonSetSpec;
use k8s_openapi::api::core::v1::{Container, EnvVar, EnvVarSource, PodSpec};
use std::collections::BTreeMap;

/// How a managed field is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonRule {
    /// Single value equality; absent equals empty string
    Scalar,
    /// Length and element-wise equality; absent equals empty
    OrderedSequence,
    /// Key/value equality regardless of order; absent equals empty
    Mapping,
    /// Every desired key present with the same value; extra keys ignored
    LabelSubset,
    /// Membership of a list keyed by `name`; order ignored
    NameKeyedSet,
}

/// A managed field of the `DaemonSet` spec (outside of individual containers).
pub struct WorkloadField {
    /// Field path as shown in logs and drift reports
    pub path: &'static str,
    pub rule: ComparisonRule,
    /// The API server rejects in-place changes to this field
    pub requires_recreate: bool,
    differs: fn(&DaemonSetSpec, &DaemonSetSpec) -> bool,
    overwrite: fn(&mut DaemonSetSpec, &DaemonSetSpec),
    populated: fn(&DaemonSetSpec) -> bool,
}

impl WorkloadField {
    /// Returns true if `current` must be corrected to match `desired`.
    #[must_use]
    pub fn differs(&self, current: &DaemonSetSpec, desired: &DaemonSetSpec) -> bool {
        (self.differs)(current, desired)
    }

    /// Copies the desired value of this field into `target`.
    pub fn overwrite(&self, target: &mut DaemonSetSpec, desired: &DaemonSetSpec) {
        (self.overwrite)(target, desired);
    }

    /// Returns true if `spec` sets this field to a non-empty value.
    #[must_use]
    pub fn is_populated(&self, spec: &DaemonSetSpec) -> bool {
        (self.populated)(spec)
    }
}

/// A managed field of a single container, matched by container name.
pub struct ContainerField {
    /// Field path as shown in logs and drift reports
    pub path: &'static str,
    pub rule: ComparisonRule,
    differs: fn(&Container, &Container) -> bool,
    overwrite: fn(&mut Container, &Container),
    populated: fn(&Container) -> bool,
}

impl ContainerField {
    /// Returns true if `current` must be corrected to match `desired`.
    #[must_use]
    pub fn differs(&self, current: &Container, desired: &Container) -> bool {
        (self.differs)(current, desired)
    }

    /// Copies the desired value of this field into `target`.
    pub fn overwrite(&self, target: &mut Container, desired: &Container) {
        (self.overwrite)(target, desired);
    }

    /// Returns true if `container` sets this field to a non-empty value.
    #[must_use]
    pub fn is_populated(&self, container: &Container) -> bool {
        (self.populated)(container)
    }
}

/// Container membership row. Containers are joined on `name`.
pub struct ContainerSetField {
    pub path: &'static str,
    pub rule: ComparisonRule,
}

/// Managed workload-level fields, in comparison order.
pub const WORKLOAD_FIELDS: &[WorkloadField] = &[
    WorkloadField {
        path: "spec.selector",
        rule: ComparisonRule::Mapping,
        requires_recreate: true,
        differs: selector_differs,
        overwrite: |target, desired| target.selector = desired.selector.clone(),
        populated: |spec| !is_empty_map(spec.selector.match_labels.as_ref()),
    },
    WorkloadField {
        path: "spec.template.metadata.labels",
        rule: ComparisonRule::LabelSubset,
        requires_recreate: false,
        differs: binding_labels_differ,
        overwrite: overwrite_binding_labels,
        populated: |spec| {
            !is_empty_map(
                spec.template
                    .metadata
                    .as_ref()
                    .and_then(|m| m.labels.as_ref()),
            )
        },
    },
    WorkloadField {
        path: "spec.template.spec.nodeSelector",
        rule: ComparisonRule::Mapping,
        requires_recreate: false,
        differs: |current, desired| {
            !mappings_equal(
                pod_spec(current).and_then(|p| p.node_selector.as_ref()),
                pod_spec(desired).and_then(|p| p.node_selector.as_ref()),
            )
        },
        overwrite: |target, desired| {
            pod_spec_mut(target).node_selector =
                pod_spec(desired).and_then(|p| p.node_selector.clone());
        },
        populated: |spec| !is_empty_map(pod_spec(spec).and_then(|p| p.node_selector.as_ref())),
    },
];

/// Managed container membership.
pub const CONTAINER_SET: ContainerSetField = ContainerSetField {
    path: "spec.template.spec.containers",
    rule: ComparisonRule::NameKeyedSet,
};

/// Managed per-container fields, in comparison order.
pub const CONTAINER_FIELDS: &[ContainerField] = &[
    ContainerField {
        path: "image",
        rule: ComparisonRule::Scalar,
        differs: |current, desired| {
            current.image.as_deref().unwrap_or_default()
                != desired.image.as_deref().unwrap_or_default()
        },
        overwrite: |target, desired| target.image = desired.image.clone(),
        populated: |c| !c.image.as_deref().unwrap_or_default().is_empty(),
    },
    ContainerField {
        path: "command",
        rule: ComparisonRule::OrderedSequence,
        differs: |current, desired| {
            !sequences_equal(current.command.as_deref(), desired.command.as_deref())
        },
        overwrite: |target, desired| target.command = desired.command.clone(),
        populated: |c| !c.command.as_deref().unwrap_or_default().is_empty(),
    },
    ContainerField {
        path: "args",
        rule: ComparisonRule::OrderedSequence,
        differs: |current, desired| {
            !sequences_equal(current.args.as_deref(), desired.args.as_deref())
        },
        overwrite: |target, desired| target.args = desired.args.clone(),
        populated: |c| !c.args.as_deref().unwrap_or_default().is_empty(),
    },
    ContainerField {
        path: "env",
        rule: ComparisonRule::Mapping,
        differs: |current, desired| {
            env_mapping(current.env.as_deref()) != env_mapping(desired.env.as_deref())
        },
        overwrite: |target, desired| target.env = desired.env.clone(),
        populated: |c| !c.env.as_deref().unwrap_or_default().is_empty(),
    },
];

/// Pod spec of a `DaemonSet` spec, if any.
#[must_use]
pub fn pod_spec(spec: &DaemonSetSpec) -> Option<&PodSpec> {
    spec.template.spec.as_ref()
}

/// Pod spec of a `DaemonSet` spec, created empty if missing.
pub fn pod_spec_mut(spec: &mut DaemonSetSpec) -> &mut PodSpec {
    spec.template.spec.get_or_insert_with(PodSpec::default)
}

/// Compares two ordered sequences, treating absent as empty.
#[must_use]
pub fn sequences_equal(current: Option<&[String]>, desired: Option<&[String]>) -> bool {
    current.unwrap_or_default() == desired.unwrap_or_default()
}

/// Compares two string mappings, treating absent as empty.
#[must_use]
pub fn mappings_equal(
    current: Option<&BTreeMap<String, String>>,
    desired: Option<&BTreeMap<String, String>>,
) -> bool {
    match (current, desired) {
        (Some(current), Some(desired)) => current == desired,
        (Some(only), None) | (None, Some(only)) => only.is_empty(),
        (None, None) => true,
    }
}

fn is_empty_map(map: Option<&BTreeMap<String, String>>) -> bool {
    map.is_none_or(BTreeMap::is_empty)
}

/// Value of an environment variable as far as equality is concerned.
pub type EnvValue<'a> = (&'a str, Option<&'a EnvVarSource>);

/// Environment variables keyed by name.
///
/// Later duplicates win, matching how the kubelet resolves them. An unset value
/// and an empty one are the same to a process.
#[must_use]
pub fn env_mapping(env: Option<&[EnvVar]>) -> BTreeMap<&str, EnvValue<'_>> {
    env.unwrap_or_default()
        .iter()
        .map(|var| {
            (
                var.name.as_str(),
                (
                    var.value.as_deref().unwrap_or_default(),
                    var.value_from.as_ref(),
                ),
            )
        })
        .collect()
}

fn selector_differs(current: &DaemonSetSpec, desired: &DaemonSetSpec) -> bool {
    !mappings_equal(
        current.selector.match_labels.as_ref(),
        desired.selector.match_labels.as_ref(),
    ) || current.selector.match_expressions.as_deref().unwrap_or_default()
        != desired
            .selector
            .match_expressions
            .as_deref()
            .unwrap_or_default()
}

fn template_labels(spec: &DaemonSetSpec) -> Option<&BTreeMap<String, String>> {
    spec.template
        .metadata
        .as_ref()
        .and_then(|m| m.labels.as_ref())
}

/// Selector-binding labels are the keys of the desired selector.
fn binding_labels_differ(current: &DaemonSetSpec, desired: &DaemonSetSpec) -> bool {
    let Some(binding) = desired.selector.match_labels.as_ref() else {
        return false;
    };
    let labels = template_labels(current);
    binding
        .iter()
        .any(|(key, value)| labels.and_then(|l| l.get(key)) != Some(value))
}

fn overwrite_binding_labels(target: &mut DaemonSetSpec, desired: &DaemonSetSpec) {
    let Some(binding) = desired.selector.match_labels.as_ref() else {
        return;
    };
    let labels = target
        .template
        .metadata
        .get_or_insert_with(Default::default)
        .labels
        .get_or_insert_with(BTreeMap::new);
    for (key, value) in binding {
        labels.insert(key.clone(), value.clone());
    }
}
