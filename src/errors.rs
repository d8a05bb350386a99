// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for DaemonSet synthesis and drift detection.
//!
//! Both failure modes are configuration problems: retrying with the same inputs
//! reproduces the same error, so callers should surface them and wait for the
//! configuration to change.

use thiserror::Error;

/// Errors returned while synthesizing the desired `DaemonSet`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthesisError {
    /// A required input is empty or malformed.
    ///
    /// No partial `DaemonSet` is produced when this is returned.
    #[error("Invalid input '{field}': {reason}")]
    InvalidInput {
        /// Name of the offending input (e.g. `cluster_service_ip`)
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Which of the two compared objects an [`DriftError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecSide {
    /// The live object read from the API server
    Current,
    /// The freshly synthesized object
    Desired,
}

impl std::fmt::Display for SpecSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Current => f.write_str("current"),
            Self::Desired => f.write_str("desired"),
        }
    }
}

/// Errors returned by drift detection.
///
/// Drift detection is total over well-formed objects; this only signals a
/// precondition violation that must be fixed upstream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriftError {
    /// The object cannot be compared by container name.
    #[error("Inconsistent {side} DaemonSet: {reason}")]
    InconsistentSpec {
        /// Which object is malformed
        side: SpecSide,
        /// Explanation, e.g. the duplicated container name
        reason: String,
    },
}

/// Composite error covering every failure of the synthesis/drift core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeDnsError {
    /// Desired-state synthesis failed
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    /// Drift detection failed
    #[error(transparent)]
    Drift(#[from] DriftError),
}

impl NodeDnsError {
    /// Returns true if retrying without a configuration change could succeed.
    ///
    /// Always false today; API and network errors never reach this type.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Synthesis(SynthesisError::InvalidInput { .. })
            | Self::Drift(DriftError::InconsistentSpec { .. }) => false,
        }
    }

    /// Short machine-readable reason, used as a metrics label and in events.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Synthesis(SynthesisError::InvalidInput { .. }) => "InvalidInput",
            Self::Drift(DriftError::InconsistentSpec { .. }) => "InconsistentSpec",
        }
    }
}
