// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use clap::Parser;
use futures::StreamExt;
use k8s_openapi::api::apps::v1::DaemonSet;
use kube::{
    runtime::{watcher::Config, Controller},
    Api, Client,
};
use nodedns::{
    config::{CheckArgs, Cli, Command, LogFormat, RenderArgs, RunArgs},
    constants::TOKIO_WORKER_THREADS,
    context::Context,
    metrics::serve_metrics,
    reconcilers::{error_policy, reconcile_dns_daemonset, reconcile_once},
    render::{check_daemonset, format_check_report, render_daemonset},
};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Exit status of `check` when drift was found
const DRIFT_EXIT_CODE: i32 = 1;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    match cli.command {
        Command::Run(args) => {
            // Build Tokio runtime with custom thread names
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(TOKIO_WORKER_THREADS)
                .thread_name("nodedns-controller")
                .enable_all()
                .build()?;

            runtime.block_on(run(args))
        }
        Command::Render(args) => render(&args),
        Command::Check(args) => check(&args),
    }
}

/// Initialize logging.
///
/// Format: timestamp file:line LEVEL message. `RUST_LOG` sets the level (default
/// INFO). Logs go to stderr so `render` and `check` output stays pipeable.
fn init_logging(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_writer(std::io::stderr)
                .json()
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
    debug!("Logging initialized with file and line number tracking");
}

async fn run(args: RunArgs) -> Result<()> {
    info!("Starting per-node DNS controller");

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;
    debug!("Kubernetes client initialized successfully");

    let ctx = Arc::new(Context::new(
        client,
        args.workload.identity(),
        args.workload.inputs(),
        Duration::from_secs(args.resync_secs),
    ));

    // The controller only sees the object once it exists, so ensure it up front
    match reconcile_once(&ctx).await {
        Ok(outcome) => info!(outcome = outcome.as_str(), "Initial reconciliation finished"),
        Err(e) => warn!("Initial reconciliation failed, will retry: {:#}", e),
    }

    // Controllers should never exit - if one does, we log it and exit the main process
    tokio::select! {
        result = run_daemonset_controller(ctx.clone()) => {
            error!("CRITICAL: DaemonSet controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("DaemonSet controller exited unexpectedly without error")
        }
        result = run_resync_loop(ctx.clone()) => {
            error!("CRITICAL: resync loop exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("Resync loop exited unexpectedly without error")
        }
        result = serve_metrics(args.metrics_port) => {
            error!("CRITICAL: metrics server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("Metrics server exited unexpectedly without error")
        }
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Received shutdown signal, stopping");
            Ok(())
        }
    }
}

/// Run the `DaemonSet` controller, watching only the managed object
async fn run_daemonset_controller(ctx: Arc<Context>) -> Result<()> {
    info!(
        "Starting DaemonSet controller for {}/{}",
        ctx.identity.namespace, ctx.identity.name
    );

    let api = Api::<DaemonSet>::namespaced(ctx.client.clone(), &ctx.identity.namespace);
    let config = Config::default().fields(&format!("metadata.name={}", ctx.identity.name));

    Controller::new(api, config)
        .run(reconcile_dns_daemonset, error_policy, ctx)
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Periodically re-run reconciliation; also recreates the object after a delete,
/// which the controller does not reconcile.
async fn run_resync_loop(ctx: Arc<Context>) -> Result<()> {
    let mut interval = tokio::time::interval(ctx.resync);
    // The first tick completes immediately and the initial pass already ran
    interval.tick().await;

    loop {
        interval.tick().await;
        debug!("Periodic resync");
        if let Err(e) = reconcile_once(&ctx).await {
            error!("Periodic reconciliation failed: {:#}", e);
        }
    }
}

fn render(args: &RenderArgs) -> Result<()> {
    let rendered = render_daemonset(
        &args.workload.identity(),
        &args.workload.inputs(),
        args.output,
    )?;
    std::io::stdout().write_all(rendered.as_bytes())?;
    Ok(())
}

fn check(args: &CheckArgs) -> Result<()> {
    let report = check_daemonset(
        &args.current,
        &args.workload.identity(),
        &args.workload.inputs(),
    )?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(format_check_report(&report, args.output)?.as_bytes())?;
    stdout.flush()?;

    if report.changed {
        info!(
            differences = report.differences.len(),
            "DaemonSet has drifted, corrected object included in the report"
        );
        std::process::exit(DRIFT_EXIT_CODE);
    }

    info!("DaemonSet matches the synthesized spec");
    Ok(())
}
