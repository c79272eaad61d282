//! Reconciliation loop tests
//!
//! Drive the generic reconciler against in-memory store, event sink and
//! driver fakes, without a cluster or cloud backend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{OwnerReference, Time};
use kube::core::{ApiResource, ErrorResponse};
use kube_runtime::controller::Action;
use kube_runtime::events::EventType;

use rdb_operator::constants::{FINALIZER_NAME, IGNORE_ANNOTATION, REASON_PERMISSIONS_DENIED};
use rdb_operator::controller::{Error, EventSink, ObjectStore, Reconciler};
use rdb_operator::crd::{
    ConditionStatus, ConditionType, ManagedResource, RDBInstance, RDBInstanceSpec,
};
use rdb_operator::manager::{Manager, ManagerError, ObjectKey, Owner};
use rdb_operator::scaleway;

const BASE: Duration = Duration::from_secs(30);

fn conflict() -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: "the object has been modified".to_string(),
        reason: "Conflict".to_string(),
        code: 409,
    })
}

fn not_found() -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: "not found".to_string(),
        reason: "NotFound".to_string(),
        code: 404,
    })
}

/// In-memory object store holding a single object
#[derive(Default)]
struct TestStore {
    object: Mutex<Option<RDBInstance>>,
    owner: Option<OwnerReference>,
    fail_status_update: bool,
    updates: AtomicUsize,
    status_updates: AtomicUsize,
}

impl TestStore {
    fn with_object(object: RDBInstance) -> Self {
        Self {
            object: Mutex::new(Some(object)),
            ..Default::default()
        }
    }

    fn stored(&self) -> RDBInstance {
        self.object
            .lock()
            .unwrap()
            .clone()
            .expect("store should hold an object")
    }
}

#[async_trait]
impl ObjectStore<RDBInstance> for TestStore {
    async fn get(&self, _key: &ObjectKey) -> Result<Option<RDBInstance>, kube::Error> {
        Ok(self.object.lock().unwrap().clone())
    }

    async fn update(&self, obj: &RDBInstance) -> Result<RDBInstance, kube::Error> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        *self.object.lock().unwrap() = Some(obj.clone());
        Ok(obj.clone())
    }

    async fn update_status(&self, obj: &RDBInstance) -> Result<RDBInstance, kube::Error> {
        if self.fail_status_update {
            return Err(conflict());
        }
        self.status_updates.fetch_add(1, Ordering::SeqCst);
        *self.object.lock().unwrap() = Some(obj.clone());
        Ok(obj.clone())
    }

    async fn resolve_owner(&self, _owner: &Owner) -> Result<OwnerReference, kube::Error> {
        self.owner.clone().ok_or_else(not_found)
    }
}

/// Records published events
#[derive(Default)]
struct TestEvents {
    published: Mutex<Vec<String>>,
}

#[async_trait]
impl EventSink<RDBInstance> for TestEvents {
    async fn publish(&self, _obj: &RDBInstance, _type: EventType, reason: &str, _note: &str) {
        self.published.lock().unwrap().push(reason.to_string());
    }
}

/// What the fake driver reports from ensure/delete
#[derive(Clone, Copy)]
enum Outcome {
    Done,
    InProgress,
    PermissionsDenied,
    Unclassified,
}

struct TestManager {
    ensure: Outcome,
    delete: Outcome,
    owners: Vec<Owner>,
    ensure_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl Default for TestManager {
    fn default() -> Self {
        Self {
            ensure: Outcome::Done,
            delete: Outcome::Done,
            owners: Vec::new(),
            ensure_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
        }
    }
}

impl Outcome {
    fn as_result(self) -> Result<bool, ManagerError> {
        match self {
            Outcome::Done => Ok(true),
            Outcome::InProgress => Ok(false),
            Outcome::PermissionsDenied => {
                Err(ManagerError::Scaleway(scaleway::Error::PermissionsDenied {
                    message: "denied".to_string(),
                }))
            }
            Outcome::Unclassified => Err(ManagerError::Other(anyhow::anyhow!("boom"))),
        }
    }
}

#[async_trait]
impl Manager<RDBInstance> for TestManager {
    async fn ensure(&self, _obj: &mut RDBInstance) -> Result<bool, ManagerError> {
        self.ensure_calls.fetch_add(1, Ordering::SeqCst);
        self.ensure.as_result()
    }

    async fn delete(&self, _obj: &mut RDBInstance) -> Result<bool, ManagerError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.delete.as_result()
    }

    async fn get_owners(&self, _obj: &RDBInstance) -> Result<Vec<Owner>, ManagerError> {
        Ok(self.owners.clone())
    }
}

fn instance() -> RDBInstance {
    let mut instance = RDBInstance::new(
        "my-instance",
        RDBInstanceSpec {
            instance_id: String::new(),
            region: "fr-par".to_string(),
            instance_from: None,
            engine: "PostgreSQL-14".to_string(),
            node_type: "db-dev-s".to_string(),
            is_ha_cluster: false,
            auto_backup: None,
            acl: None,
        },
    );
    instance.metadata.namespace = Some("default".to_string());
    instance
}

fn finalized(mut instance: RDBInstance) -> RDBInstance {
    instance.metadata.finalizers = Some(vec![FINALIZER_NAME.to_string()]);
    instance
}

fn deleting(mut instance: RDBInstance) -> RDBInstance {
    instance.metadata.deletion_timestamp = Some(Time(chrono::Utc::now()));
    instance
}

fn ignored(mut instance: RDBInstance) -> RDBInstance {
    instance
        .metadata
        .annotations
        .get_or_insert_with(Default::default)
        .insert(IGNORE_ANNOTATION.to_string(), "True".to_string());
    instance
}

fn key() -> ObjectKey {
    ObjectKey::new("default", "my-instance")
}

fn reconciler(
    store: &Arc<TestStore>,
    events: &Arc<TestEvents>,
    manager: &Arc<TestManager>,
) -> Reconciler<RDBInstance> {
    Reconciler::new(
        Arc::clone(store) as Arc<dyn ObjectStore<RDBInstance>>,
        Arc::clone(events) as Arc<dyn EventSink<RDBInstance>>,
        Arc::clone(manager) as Arc<dyn Manager<RDBInstance>>,
        BASE,
    )
}

fn reconciled_status(instance: &RDBInstance) -> ConditionStatus {
    instance
        .status()
        .condition(ConditionType::Reconciled)
        .expect("Reconciled condition should be set")
        .status
}

#[tokio::test]
async fn first_pass_only_adds_the_finalizer() {
    let store = Arc::new(TestStore::with_object(instance()));
    let events = Arc::new(TestEvents::default());
    let manager = Arc::new(TestManager::default());

    let action = reconciler(&store, &events, &manager)
        .reconcile(&key())
        .await
        .unwrap();

    assert_eq!(action, Action::await_change());
    assert_eq!(manager.ensure_calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.updates.load(Ordering::SeqCst), 1);
    let finalizers = store.stored().metadata.finalizers.unwrap();
    assert_eq!(finalizers, vec![FINALIZER_NAME.to_string()]);
}

#[tokio::test]
async fn successful_ensure_sets_condition_true_without_requeue() {
    let store = Arc::new(TestStore::with_object(finalized(instance())));
    let events = Arc::new(TestEvents::default());
    let manager = Arc::new(TestManager::default());

    let action = reconciler(&store, &events, &manager)
        .reconcile(&key())
        .await
        .unwrap();

    assert_eq!(action, Action::await_change());
    assert_eq!(manager.ensure_calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.status_updates.load(Ordering::SeqCst), 1);
    assert_eq!(reconciled_status(&store.stored()), ConditionStatus::True);
}

#[tokio::test]
async fn in_progress_ensure_requeues_at_base_interval() {
    let store = Arc::new(TestStore::with_object(finalized(instance())));
    let events = Arc::new(TestEvents::default());
    let manager = Arc::new(TestManager {
        ensure: Outcome::InProgress,
        ..Default::default()
    });

    let action = reconciler(&store, &events, &manager)
        .reconcile(&key())
        .await
        .unwrap();

    assert_eq!(action, Action::requeue(BASE));
    assert_eq!(reconciled_status(&store.stored()), ConditionStatus::False);
}

#[tokio::test]
async fn classified_error_is_consumed_and_requeued_per_policy() {
    let store = Arc::new(TestStore::with_object(finalized(instance())));
    let events = Arc::new(TestEvents::default());
    let manager = Arc::new(TestManager {
        ensure: Outcome::PermissionsDenied,
        ..Default::default()
    });

    let action = reconciler(&store, &events, &manager)
        .reconcile(&key())
        .await
        .unwrap();

    assert_eq!(action, Action::requeue(BASE * 10));
    let stored = store.stored();
    assert_eq!(reconciled_status(&stored), ConditionStatus::False);
    let condition = stored.status();
    let condition = condition.condition(ConditionType::Reconciled).unwrap();
    assert_eq!(condition.reason, REASON_PERMISSIONS_DENIED);
}

#[tokio::test]
async fn unclassified_error_is_propagated_after_status_update() {
    let store = Arc::new(TestStore::with_object(finalized(instance())));
    let events = Arc::new(TestEvents::default());
    let manager = Arc::new(TestManager {
        ensure: Outcome::Unclassified,
        ..Default::default()
    });

    let result = reconciler(&store, &events, &manager).reconcile(&key()).await;

    assert!(matches!(result, Err(Error::Ensure(_))));
    // The failure is still observable on the object
    assert_eq!(store.status_updates.load(Ordering::SeqCst), 1);
    assert_eq!(reconciled_status(&store.stored()), ConditionStatus::False);
}

#[tokio::test]
async fn deletion_invokes_delete_and_never_ensure() {
    let store = Arc::new(TestStore::with_object(deleting(finalized(instance()))));
    let events = Arc::new(TestEvents::default());
    let manager = Arc::new(TestManager::default());

    let action = reconciler(&store, &events, &manager)
        .reconcile(&key())
        .await
        .unwrap();

    assert_eq!(action, Action::await_change());
    assert_eq!(manager.ensure_calls.load(Ordering::SeqCst), 0);
    assert_eq!(manager.delete_calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.stored().metadata.finalizers.unwrap_or_default().len(), 0);
    assert_eq!(*events.published.lock().unwrap(), vec!["Deleted".to_string()]);
}

#[tokio::test]
async fn still_deleting_keeps_the_finalizer_and_polls() {
    let store = Arc::new(TestStore::with_object(deleting(finalized(instance()))));
    let events = Arc::new(TestEvents::default());
    let manager = Arc::new(TestManager {
        delete: Outcome::InProgress,
        ..Default::default()
    });

    let action = reconciler(&store, &events, &manager)
        .reconcile(&key())
        .await
        .unwrap();

    assert_eq!(action, Action::requeue(BASE));
    assert_eq!(store.status_updates.load(Ordering::SeqCst), 1);
    let finalizers = store.stored().metadata.finalizers.unwrap();
    assert_eq!(finalizers, vec![FINALIZER_NAME.to_string()]);
}

#[tokio::test]
async fn deletion_without_finalizer_is_a_noop() {
    let store = Arc::new(TestStore::with_object(deleting(instance())));
    let events = Arc::new(TestEvents::default());
    let manager = Arc::new(TestManager::default());

    let action = reconciler(&store, &events, &manager)
        .reconcile(&key())
        .await
        .unwrap();

    assert_eq!(action, Action::await_change());
    assert_eq!(manager.delete_calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.updates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn ignore_annotation_short_circuits_even_on_deletion() {
    let store = Arc::new(TestStore::with_object(ignored(deleting(finalized(
        instance(),
    )))));
    let events = Arc::new(TestEvents::default());
    let manager = Arc::new(TestManager::default());

    let action = reconciler(&store, &events, &manager)
        .reconcile(&key())
        .await
        .unwrap();

    assert_eq!(action, Action::await_change());
    assert_eq!(manager.ensure_calls.load(Ordering::SeqCst), 0);
    assert_eq!(manager.delete_calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.stored().metadata.finalizers.unwrap_or_default().len(), 0);
    assert_eq!(*events.published.lock().unwrap(), vec!["Ignoring".to_string()]);
}

#[tokio::test]
async fn ignore_annotation_skips_driver_but_keeps_object() {
    let store = Arc::new(TestStore::with_object(ignored(instance())));
    let events = Arc::new(TestEvents::default());
    let manager = Arc::new(TestManager::default());

    let action = reconciler(&store, &events, &manager)
        .reconcile(&key())
        .await
        .unwrap();

    assert_eq!(action, Action::await_change());
    assert_eq!(manager.ensure_calls.load(Ordering::SeqCst), 0);
    // No finalizer is added to ignored objects
    assert!(store.stored().metadata.finalizers.is_none());
    assert_eq!(store.updates.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn missing_object_is_nothing_to_do() {
    let store = Arc::new(TestStore::default());
    let events = Arc::new(TestEvents::default());
    let manager = Arc::new(TestManager::default());

    let action = reconciler(&store, &events, &manager)
        .reconcile(&key())
        .await
        .unwrap();

    assert_eq!(action, Action::await_change());
    assert_eq!(manager.ensure_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn status_update_failure_fails_the_pass() {
    let store = Arc::new(TestStore {
        object: Mutex::new(Some(finalized(instance()))),
        fail_status_update: true,
        ..Default::default()
    });
    let events = Arc::new(TestEvents::default());
    let manager = Arc::new(TestManager::default());

    let result = reconciler(&store, &events, &manager).reconcile(&key()).await;

    assert!(matches!(result, Err(Error::StatusUpdateFailed(_))));
}

#[tokio::test]
async fn owner_is_linked_when_fetchable() {
    let owner = Owner {
        key: ObjectKey::new("default", "parent"),
        api_resource: ApiResource::erase::<RDBInstance>(&()),
    };
    let store = Arc::new(TestStore {
        object: Mutex::new(Some(finalized(instance()))),
        owner: Some(OwnerReference {
            api_version: "rdb.scaleway.com/v1alpha1".to_string(),
            kind: "RDBInstance".to_string(),
            name: "parent".to_string(),
            uid: "uid-1".to_string(),
            controller: Some(true),
            block_owner_deletion: None,
        }),
        ..Default::default()
    });
    let events = Arc::new(TestEvents::default());
    let manager = Arc::new(TestManager {
        owners: vec![owner],
        ..Default::default()
    });

    reconciler(&store, &events, &manager)
        .reconcile(&key())
        .await
        .unwrap();

    let owner_refs = store.stored().metadata.owner_references.unwrap();
    assert_eq!(owner_refs.len(), 1);
    assert_eq!(owner_refs[0].uid, "uid-1");
    assert_eq!(owner_refs[0].controller, Some(true));
}

#[tokio::test]
async fn unfetchable_owner_never_fails_the_pass() {
    let owner = Owner {
        key: ObjectKey::new("default", "parent"),
        api_resource: ApiResource::erase::<RDBInstance>(&()),
    };
    let store = Arc::new(TestStore::with_object(finalized(instance())));
    let events = Arc::new(TestEvents::default());
    let manager = Arc::new(TestManager {
        owners: vec![owner],
        ..Default::default()
    });

    let action = reconciler(&store, &events, &manager)
        .reconcile(&key())
        .await
        .unwrap();

    assert_eq!(action, Action::await_change());
    assert_eq!(manager.ensure_calls.load(Ordering::SeqCst), 1);
    assert!(store.stored().metadata.owner_references.is_none());
}
