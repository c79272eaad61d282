//! # Reconciler
//!
//! One reconciliation pass for one object: finalizer lifecycle, ignore
//! check, owner linking, driver invocation, status persistence and the
//! requeue decision.
//!
//! The reconciler holds no state across passes; everything lives in the
//! fetched object or the backing store. The external controller runtime
//! guarantees at most one in-flight pass per object key.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use kube::Resource;
use kube_runtime::controller::Action;
use kube_runtime::events::EventType;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::constants::{FINALIZER_NAME, IGNORE_ANNOTATION};
use crate::crd::ManagedResource;
use crate::manager::{Manager, ManagerError, ObjectKey};
use crate::observability::metrics;

use super::owners::link_owners;
use super::status::update_status;
use super::store::{EventSink, ObjectStore};

/// Failure of a reconciliation pass
///
/// Only unexpected failures surface here; classified driver errors are
/// consumed by the status update and never reach the caller.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to fetch object: {0}")]
    Fetch(#[source] kube::Error),
    #[error("failed to update object: {0}")]
    UpdateFailed(#[source] kube::Error),
    #[error("failed to update status: {0}")]
    StatusUpdateFailed(#[source] kube::Error),
    #[error("failed to get owners: {0}")]
    GetOwners(#[source] ManagerError),
    #[error("failed to delete: {0}")]
    Delete(#[source] ManagerError),
    #[error(transparent)]
    Ensure(ManagerError),
}

/// Generic reconciler for one resource kind
pub struct Reconciler<K: ManagedResource> {
    store: Arc<dyn ObjectStore<K>>,
    events: Arc<dyn EventSink<K>>,
    manager: Arc<dyn Manager<K>>,
    requeue_duration: Duration,
}

impl<K: ManagedResource> Reconciler<K> {
    pub fn new(
        store: Arc<dyn ObjectStore<K>>,
        events: Arc<dyn EventSink<K>>,
        manager: Arc<dyn Manager<K>>,
        requeue_duration: Duration,
    ) -> Self {
        Self {
            store,
            events,
            manager,
            requeue_duration,
        }
    }

    /// Run one reconciliation pass for the object addressed by `key`
    pub async fn reconcile(&self, key: &ObjectKey) -> Result<Action, Error> {
        metrics::increment_reconciliations();
        let start = Instant::now();
        let result = self.reconcile_inner(key).await;
        metrics::observe_reconcile_duration(start.elapsed().as_secs_f64());
        result
    }

    async fn reconcile_inner(&self, key: &ObjectKey) -> Result<Action, Error> {
        let Some(mut obj) = self.store.get(key).await.map_err(Error::Fetch)? else {
            // Object truly gone, nothing to do
            debug!(object = %key, "object not found");
            return Ok(Action::await_change());
        };

        let ignored = obj
            .meta()
            .annotations
            .as_ref()
            .and_then(|annotations| annotations.get(IGNORE_ANNOTATION))
            .is_some_and(|value| value.eq_ignore_ascii_case("true"));
        if ignored {
            if obj.meta().deletion_timestamp.is_some() {
                remove_finalizer(&mut obj);
            }
            self.events
                .publish(
                    &obj,
                    EventType::Normal,
                    "Ignoring",
                    "Ignoring object based on annotation",
                )
                .await;
            self.store.update(&obj).await.map_err(Error::UpdateFailed)?;
            return Ok(Action::await_change());
        }

        if obj.meta().deletion_timestamp.is_none() {
            if !has_finalizer(&obj) {
                // The finalizer must be durably recorded before any
                // provisioning side effect; the write re-triggers the next
                // pass.
                add_finalizer(&mut obj);
                self.store.update(&obj).await.map_err(Error::UpdateFailed)?;
                debug!(object = %key, "added finalizer");
                return Ok(Action::await_change());
            }
        } else {
            if has_finalizer(&obj) {
                let deleted = self
                    .manager
                    .delete(&mut obj)
                    .await
                    .map_err(Error::Delete)?;
                if deleted {
                    self.events
                        .publish(&obj, EventType::Normal, "Deleted", "Successfully deleted")
                        .await;
                    remove_finalizer(&mut obj);
                    self.store.update(&obj).await.map_err(Error::UpdateFailed)?;
                    return Ok(Action::await_change());
                }
                info!(object = %key, "still deleting");
                self.store
                    .update_status(&obj)
                    .await
                    .map_err(Error::StatusUpdateFailed)?;
                return Ok(Action::requeue(self.requeue_duration));
            }
            return Ok(Action::await_change());
        }

        let owners = self
            .manager
            .get_owners(&obj)
            .await
            .map_err(Error::GetOwners)?;
        link_owners(self.store.as_ref(), &mut obj, &owners).await;

        info!(object = %key, "reconciling object");

        let (reconciled, ensure_err) = match self.manager.ensure(&mut obj).await {
            Ok(reconciled) => (reconciled, None),
            Err(err) => {
                error!(object = %key, "error ensuring object: {err}");
                (false, Some(err))
            }
        };

        let mut status = obj.status();
        let (requeue_after, residual) = update_status(
            &mut status,
            Utc::now(),
            ensure_err,
            reconciled,
            self.requeue_duration,
        );
        obj.set_status(status);

        self.store
            .update_status(&obj)
            .await
            .map_err(Error::StatusUpdateFailed)?;

        match residual {
            Some(err) => Err(Error::Ensure(err)),
            None => Ok(requeue_after.map_or_else(Action::await_change, Action::requeue)),
        }
    }
}

fn has_finalizer<K: ManagedResource>(obj: &K) -> bool {
    obj.meta()
        .finalizers
        .as_ref()
        .is_some_and(|finalizers| finalizers.iter().any(|f| f == FINALIZER_NAME))
}

fn add_finalizer<K: ManagedResource>(obj: &mut K) {
    let finalizers = obj.meta_mut().finalizers.get_or_insert_with(Vec::new);
    if !finalizers.iter().any(|f| f == FINALIZER_NAME) {
        finalizers.push(FINALIZER_NAME.to_string());
    }
}

fn remove_finalizer<K: ManagedResource>(obj: &mut K) {
    if let Some(finalizers) = obj.meta_mut().finalizers.as_mut() {
        finalizers.retain(|f| f != FINALIZER_NAME);
    }
}
