//! # Watch Loop
//!
//! Wires one `kube_runtime` controller per resource kind around the shared
//! reconciler. The controller runtime provides the single-flight-per-key
//! guarantee and graceful shutdown on SIGTERM/SIGINT.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use kube::api::Api;
use kube::{Client, Resource};
use kube_runtime::controller::Action;
use kube_runtime::{watcher, Controller};
use tracing::{debug, error, info, warn};

use crate::config::OperatorConfig;
use crate::crd::ManagedResource;
use crate::manager::{Manager, ObjectKey};
use crate::observability::metrics;

use super::reconcile::{Error, Reconciler};
use super::store::{KubeEvents, KubeStore};

/// Requeue with the configured error backoff after an unclassified failure
fn error_policy<K: ManagedResource>(obj: Arc<K>, error: &Error, requeue: Duration) -> Action {
    let key = ObjectKey::from_resource(obj.as_ref());
    error!(object = %key, "reconciliation error: {error}");
    metrics::increment_reconciliation_errors();
    Action::requeue(requeue)
}

/// Watch all objects of kind `K` and reconcile them with the given driver
pub async fn run_controller<K: ManagedResource>(
    client: Client,
    manager: Arc<dyn Manager<K>>,
    config: &OperatorConfig,
) -> anyhow::Result<()> {
    let api: Api<K> = Api::all(client.clone());
    let reconciler = Arc::new(Reconciler::new(
        Arc::new(KubeStore::new(client.clone())),
        Arc::new(KubeEvents::new(client)),
        manager,
        config.requeue_duration,
    ));
    let error_requeue = config.error_requeue_duration;

    info!("starting controller for {}", K::kind(&()));

    // any_semantic() picks up every semantic change (create, update, delete),
    // so newly created resources are reconciled immediately
    Controller::new(api, watcher::Config::default().any_semantic())
        .shutdown_on_signal()
        .run(
            |obj, ctx: Arc<Reconciler<K>>| async move {
                let key = ObjectKey::from_resource(obj.as_ref());
                ctx.reconcile(&key).await
            },
            move |obj, err, _ctx| error_policy(obj, err, error_requeue),
            reconciler,
        )
        .for_each(|result| async move {
            match result {
                Ok((obj_ref, _action)) => debug!("reconciled {obj_ref}"),
                Err(err) => warn!("reconcile failed: {err}"),
            }
        })
        .await;

    info!("controller for {} stopped", K::kind(&()));
    Ok(())
}
