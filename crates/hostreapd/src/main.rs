//! hostreapd — the hostreap daemon.
//!
//! Consumes Auto Scaling lifecycle notifications from SQS and, for each
//! terminating instance, deactivates and deletes the matching Rancher
//! host before completing the lifecycle hook.
//!
//! # Usage
//!
//! ```text
//! SQS_URL=https://sqs.eu-west-1.amazonaws.com/123456789012/asg-lifecycle \
//! RANCHER_SERVER_ACCESS_KEY=... RANCHER_SERVER_SECRET_KEY=... \
//! hostreapd --config /etc/hostreap.toml
//! ```
//!
//! Exits non-zero on invalid configuration or when the queue itself
//! fails; a supervisor is expected to restart it.

use std::path::PathBuf;

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};

use hostreap_aws::{AutoScalingNotifier, SqsMessageSource};
use hostreap_core::ReaperConfig;
use hostreap_pipeline::Dispatcher;
use hostreap_rancher::RancherClient;

#[derive(Debug, Parser)]
#[command(
    name = "hostreapd",
    about = "Removes terminating Auto Scaling instances from the Rancher server",
    version
)]
struct Cli {
    /// TOML config file. Environment variables override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = ReaperConfig::load(cli.config.as_deref())?;
    info!(?config, "configuration loaded");

    run(config).await
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,hostreap=debug"));

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn run(config: ReaperConfig) -> anyhow::Result<()> {
    // ── Collaborators ──────────────────────────────────────────

    let sdk = hostreap_aws::load_sdk_config(&config.aws.region).await;
    info!(region = %config.aws.region, "aws sdk configured");

    let source = SqsMessageSource::from_sdk_config(&sdk, &config.queue);
    info!(queue = %source.queue_url(), "sqs message source initialized");

    let cluster = RancherClient::from_config(&config.cluster)?;
    info!(endpoint = %cluster.endpoint(), "rancher client initialized");

    let notifier = AutoScalingNotifier::from_sdk_config(&sdk);

    let mut dispatcher = Dispatcher::new(source, cluster, notifier, config.cluster.host_label);

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received, finishing the current message");
        let _ = shutdown_tx.send(true);
    });

    // ── Dispatch ───────────────────────────────────────────────

    match dispatcher.run(shutdown_rx).await {
        Ok(_) => {
            info!("hostreap daemon stopped");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "consumer error, exiting");
            Err(e.into())
        }
    }
}

/// Resolves on Ctrl-C or SIGTERM. If no handler can be installed it
/// never resolves, so the loop keeps running.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
