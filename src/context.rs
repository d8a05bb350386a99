// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for the DNS `DaemonSet` controller.
//!
//! The controller receives an `Arc<Context>` holding the Kubernetes client and the
//! configuration values every reconciliation synthesizes from. All fields are
//! immutable after startup.

use crate::config::{SynthesisInputs, WorkloadIdentity};
use kube::Client;
use std::time::Duration;

/// Shared context passed to the controller.
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client for API operations
    pub client: Client,

    /// Name and namespace of the managed `DaemonSet`
    pub identity: WorkloadIdentity,

    /// Values the desired `DaemonSet` is synthesized from
    pub inputs: SynthesisInputs,

    /// Interval between periodic resyncs
    pub resync: Duration,
}

impl Context {
    #[must_use]
    pub fn new(
        client: Client,
        identity: WorkloadIdentity,
        inputs: SynthesisInputs,
        resync: Duration,
    ) -> Self {
        Self {
            client,
            identity,
            inputs,
            resync,
        }
    }
}
