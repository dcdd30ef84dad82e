//! credguard entry point.
//!
//! This binary is the composition root for the whole system:
//!
//! 1. **Parse configuration** from flags and environment ([`config::Config`]).
//! 2. **Wire observability**: `tracing-subscriber` with a text or JSON layer and,
//!    when an endpoint is configured, an OpenTelemetry OTLP exporter.
//! 3. **Construct infrastructure**: one [`tfc::TfcClient`] serves as both the
//!    variable source and the task-result sink.
//! 4. **Start the pipeline**: the job queue, the single worker task, and the
//!    ingestion endpoint, which runs until SIGINT/SIGTERM.
//!
//! On shutdown the worker gets [`worker::SHUTDOWN_GRACE`] to finish queued
//! jobs; whatever is still pending after that is lost.

mod config;
mod telemetry;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use runtask::AccessToken;
use tfc::TfcClient;
use tracing::{error, info, warn};
use worker::{JobQueue, Worker, WorkerConfig, JOB_QUEUE_CAPACITY, SHUTDOWN_GRACE};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    let telemetry = telemetry::init(config.log_format, config.otlp_endpoint.as_deref())?;

    let result = run(config).await;
    if let Err(err) = &result {
        error!(error = %format!("{err:#}"), "credguard stopped with an error");
    }

    telemetry.shutdown();
    result
}

async fn run(config: Config) -> anyhow::Result<()> {
    let client = Arc::new(
        TfcClient::new(&config.tfe_address, AccessToken::new(config.tfe_token))
            .context("failed to construct the platform client")?,
    );
    info!(address = %client.address(), "Using platform API");

    let (queue, receiver) = JobQueue::bounded(JOB_QUEUE_CAPACITY);
    let worker_config = WorkerConfig {
        lookup_failure: config.lookup_failure.into(),
        ..WorkerConfig::default()
    };
    let worker = Worker::new(receiver, client.clone(), client, worker_config).spawn();

    let socket = listener::bind(config.listen).await?;
    listener::serve(socket, queue, shutdown_signal()).await?;

    if !Worker::finish(worker, SHUTDOWN_GRACE).await {
        warn!("Some queued run tasks were not reported before exit");
    }
    info!("credguard stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
