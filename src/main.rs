//! # RDB Operator
//!
//! Process entrypoint: wires the Scaleway client, the three RDB controllers,
//! the admission webhooks and the metrics/probes server together.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use kube::Client;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rdb_operator::config::OperatorConfig;
use rdb_operator::constants::{DEFAULT_METRICS_PORT, DEFAULT_WEBHOOK_PORT};
use rdb_operator::controller::run_controller;
use rdb_operator::crd::{RDBDatabase, RDBInstance, RDBUser};
use rdb_operator::manager::rdb::{DatabaseManager, InstanceManager, UserManager};
use rdb_operator::manager::Manager;
use rdb_operator::observability::server::{start_server, ServerState};
use rdb_operator::observability::metrics;
use rdb_operator::scaleway::{self, RdbApi};
use rdb_operator::webhook;

#[derive(Debug, Parser)]
#[command(name = "rdb-operator", about = "Kubernetes operator for Scaleway Managed Databases")]
struct Args {
    /// Address the metrics and probes endpoint binds to
    #[arg(long, default_value_t = format!("0.0.0.0:{DEFAULT_METRICS_PORT}"))]
    metrics_addr: String,
    /// Address the admission webhook server binds to
    #[arg(long, default_value_t = format!("0.0.0.0:{DEFAULT_WEBHOOK_PORT}"))]
    webhook_addr: String,
}

fn init_tracing(config: &OperatorConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_lowercase()));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.log_format.eq_ignore_ascii_case("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = OperatorConfig::from_env();
    init_tracing(&config);

    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("rustls crypto provider was already installed");
    }

    let client = Client::try_default()
        .await
        .context("failed to create Kubernetes client")?;
    let scw_client = scaleway::Client::from_env()?;
    let rdb = RdbApi::new(scw_client);

    let instance_manager: Arc<dyn Manager<RDBInstance>> =
        Arc::new(InstanceManager::new(client.clone(), rdb.clone()));
    let database_manager: Arc<dyn Manager<RDBDatabase>> =
        Arc::new(DatabaseManager::new(client.clone(), rdb.clone()));
    let user_manager: Arc<dyn Manager<RDBUser>> =
        Arc::new(UserManager::new(client.clone(), rdb));

    metrics::register();
    let server_state = ServerState::new();
    let metrics_addr = args.metrics_addr.clone();
    let metrics_state = Arc::clone(&server_state);
    tokio::spawn(async move {
        if let Err(err) = start_server(&metrics_addr, metrics_state).await {
            warn!("metrics server stopped: {err}");
        }
    });

    // Mark the server not ready once shutdown is requested
    let shutdown_state = Arc::clone(&server_state);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        shutdown_state.is_ready.store(false, Ordering::Relaxed);
        info!("received shutdown signal, marked server as not ready");
    });

    let webhooks_enabled = std::env::var("ENABLE_WEBHOOKS").as_deref() != Ok("false");
    if webhooks_enabled {
        let router = webhook::router(
            Arc::clone(&instance_manager),
            Arc::clone(&database_manager),
            Arc::clone(&user_manager),
        );
        let webhook_addr = args.webhook_addr.clone();
        tokio::spawn(async move {
            if let Err(err) = webhook::start_webhook_server(&webhook_addr, router).await {
                warn!("webhook server stopped: {err}");
            }
        });
    }

    info!("starting operator");

    tokio::try_join!(
        run_controller::<RDBInstance>(client.clone(), instance_manager, &config),
        run_controller::<RDBDatabase>(client.clone(), database_manager, &config),
        run_controller::<RDBUser>(client.clone(), user_manager, &config),
    )?;

    info!("operator stopped");
    Ok(())
}
