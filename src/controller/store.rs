//! # Object Store and Event Sink
//!
//! Seams between the reconciler and the Kubernetes API: object reads/writes
//! go through [`ObjectStore`], audit events through [`EventSink`]. Production
//! uses the kube-backed implementations below; tests drive the reconciler
//! against in-memory fakes.

use std::marker::PhantomData;

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::{Api, PostParams};
use kube::core::DynamicObject;
use kube::{Client, Resource, ResourceExt};
use kube_runtime::events::{Event, EventType, Recorder, Reporter};
use tracing::warn;

use crate::crd::ManagedResource;
use crate::manager::{ObjectKey, Owner};

/// Persistent store for objects of kind `K`
///
/// Writes use full-object replacement: a stale `resourceVersion` fails with a
/// conflict instead of silently overwriting newer state.
#[async_trait]
pub trait ObjectStore<K>: Send + Sync {
    /// Load an object by key; `None` when it does not exist
    async fn get(&self, key: &ObjectKey) -> Result<Option<K>, kube::Error>;

    /// Replace the object (everything but its status subresource)
    async fn update(&self, obj: &K) -> Result<K, kube::Error>;

    /// Replace the object's status subresource
    async fn update_status(&self, obj: &K) -> Result<K, kube::Error>;

    /// Fetch an owner candidate and build a controller owner reference for it
    async fn resolve_owner(&self, owner: &Owner) -> Result<OwnerReference, kube::Error>;
}

/// Best-effort audit trail for objects of kind `K`
///
/// Failures to publish must never fail a reconciliation pass.
#[async_trait]
pub trait EventSink<K>: Send + Sync {
    async fn publish(&self, obj: &K, r#type: EventType, reason: &str, note: &str);
}

/// [`ObjectStore`] backed by the Kubernetes API
pub struct KubeStore<K> {
    client: Client,
    _kind: PhantomData<fn() -> K>,
}

impl<K> KubeStore<K> {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }
}

#[async_trait]
impl<K: ManagedResource> ObjectStore<K> for KubeStore<K> {
    async fn get(&self, key: &ObjectKey) -> Result<Option<K>, kube::Error> {
        let api: Api<K> = Api::namespaced(self.client.clone(), &key.namespace);
        api.get_opt(&key.name).await
    }

    async fn update(&self, obj: &K) -> Result<K, kube::Error> {
        let namespace = obj.namespace().unwrap_or_default();
        let api: Api<K> = Api::namespaced(self.client.clone(), &namespace);
        api.replace(&obj.name_any(), &PostParams::default(), obj).await
    }

    async fn update_status(&self, obj: &K) -> Result<K, kube::Error> {
        let namespace = obj.namespace().unwrap_or_default();
        let api: Api<K> = Api::namespaced(self.client.clone(), &namespace);
        let data = serde_json::to_vec(obj).map_err(kube::Error::SerdeError)?;
        api.replace_status(&obj.name_any(), &PostParams::default(), data)
            .await
    }

    async fn resolve_owner(&self, owner: &Owner) -> Result<OwnerReference, kube::Error> {
        let api: Api<DynamicObject> = Api::namespaced_with(
            self.client.clone(),
            &owner.key.namespace,
            &owner.api_resource,
        );
        let resolved = api.get(&owner.key.name).await?;

        Ok(OwnerReference {
            api_version: owner.api_resource.api_version.clone(),
            kind: owner.api_resource.kind.clone(),
            name: resolved.name_any(),
            uid: resolved.uid().unwrap_or_default(),
            controller: Some(true),
            block_owner_deletion: None,
        })
    }
}

/// [`EventSink`] publishing Kubernetes events through a [`Recorder`]
pub struct KubeEvents {
    recorder: Recorder,
}

impl KubeEvents {
    pub fn new(client: Client) -> Self {
        let reporter = Reporter {
            controller: "rdb-operator".into(),
            instance: std::env::var("HOSTNAME").ok(),
        };
        Self {
            recorder: Recorder::new(client, reporter),
        }
    }
}

#[async_trait]
impl<K: ManagedResource> EventSink<K> for KubeEvents {
    async fn publish(&self, obj: &K, r#type: EventType, reason: &str, note: &str) {
        let event = Event {
            type_: r#type,
            reason: reason.to_string(),
            note: Some(note.to_string()),
            action: reason.to_string(),
            secondary: None,
        };
        if let Err(err) = self.recorder.publish(&event, &obj.object_ref(&())).await {
            warn!("failed to publish event {reason}: {err}");
        }
    }
}
