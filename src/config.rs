// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Configuration values for synthesis and the operator command line.
//!
//! [`WorkloadIdentity`] and [`SynthesisInputs`] are the plain values the core
//! functions take. [`Cli`] parses them (plus runtime settings) from flags or
//! environment variables.

use crate::constants::{
    DEFAULT_DAEMONSET_NAME, DEFAULT_NAMESPACE, DEFAULT_RESYNC_SECS, METRICS_SERVER_PORT,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Name and namespace of the managed `DaemonSet`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadIdentity {
    pub name: String,
    pub namespace: String,
}

impl WorkloadIdentity {
    #[must_use]
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }
}

impl Default for WorkloadIdentity {
    fn default() -> Self {
        Self::new(DEFAULT_DAEMONSET_NAME, DEFAULT_NAMESPACE)
    }
}

/// Inputs from which the desired `DaemonSet` is synthesized.
///
/// Values are validated by [`crate::dns_daemonset::build_dns_daemonset`], not here,
/// so that a bad value surfaces as [`crate::errors::SynthesisError::InvalidInput`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisInputs {
    /// IP address of the cluster DNS `Service`
    pub cluster_service_ip: String,
    /// Cluster DNS domain, e.g. `cluster.local`
    pub cluster_domain: String,
    /// Image of the DNS cache/resolver container
    pub agent_image: String,
    /// Image of the node resolver container
    pub tooling_image: String,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Output format for rendered objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
}

/// Per-node DNS `DaemonSet` operator.
#[derive(Debug, Parser)]
#[command(name = "nodedns", version, about)]
pub struct Cli {
    /// Log format (`RUST_LOG` controls the level)
    #[arg(long, env = "RUST_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Keep the DNS `DaemonSet` in the cluster in sync with the synthesized spec
    Run(RunArgs),
    /// Print the synthesized `DaemonSet`
    Render(RenderArgs),
    /// Compare a `DaemonSet` read from a file against the synthesized spec
    Check(CheckArgs),
}

/// Flags shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct WorkloadArgs {
    /// IP address of the cluster DNS service
    #[arg(long, env = "CLUSTER_SERVICE_IP")]
    pub cluster_service_ip: String,

    /// Cluster DNS domain
    #[arg(long, env = "CLUSTER_DOMAIN", default_value = "cluster.local")]
    pub cluster_domain: String,

    /// Image of the DNS cache/resolver container
    #[arg(long, env = "AGENT_IMAGE")]
    pub agent_image: String,

    /// Image of the node resolver container
    #[arg(long, env = "TOOLING_IMAGE")]
    pub tooling_image: String,

    /// Name of the managed `DaemonSet`
    #[arg(long, env = "DAEMONSET_NAME", default_value = DEFAULT_DAEMONSET_NAME)]
    pub name: String,

    /// Namespace of the managed `DaemonSet`
    #[arg(long, env = "POD_NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    pub namespace: String,
}

impl WorkloadArgs {
    #[must_use]
    pub fn identity(&self) -> WorkloadIdentity {
        WorkloadIdentity::new(&self.name, &self.namespace)
    }

    #[must_use]
    pub fn inputs(&self) -> SynthesisInputs {
        SynthesisInputs {
            cluster_service_ip: self.cluster_service_ip.clone(),
            cluster_domain: self.cluster_domain.clone(),
            agent_image: self.agent_image.clone(),
            tooling_image: self.tooling_image.clone(),
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub workload: WorkloadArgs,

    /// Port of the Prometheus metrics endpoint
    #[arg(long, env = "METRICS_PORT", default_value_t = METRICS_SERVER_PORT)]
    pub metrics_port: u16,

    /// Seconds between periodic resyncs of the `DaemonSet`
    #[arg(long, env = "RESYNC_SECS", default_value_t = DEFAULT_RESYNC_SECS)]
    pub resync_secs: u64,
}

#[derive(Debug, Clone, Args)]
pub struct RenderArgs {
    #[command(flatten)]
    pub workload: WorkloadArgs,

    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub output: OutputFormat,
}

#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub workload: WorkloadArgs,

    /// YAML or JSON file holding the live `DaemonSet`
    #[arg(long)]
    pub current: PathBuf,

    /// Format of the corrected `DaemonSet`, printed when drift is found
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub output: OutputFormat,
}
