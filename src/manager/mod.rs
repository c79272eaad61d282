//! # Resource Drivers
//!
//! The [`Manager`] contract implemented once per resource kind, plus the RDB
//! drivers. The reconciler only ever talks to a driver through this trait:
//! `ensure` converges the backing cloud resource, `delete` tears it down, and
//! `get_owners` reports owning objects to link. The two validate operations
//! are consumed by the admission webhooks, outside the reconcile loop.

pub mod rdb;
mod validation;

use async_trait::async_trait;
use kube::core::ApiResource;
use kube::ResourceExt;
use thiserror::Error;

pub use validation::{FieldError, FieldErrorKind, FieldErrorList};

use crate::scaleway;

/// Namespace/name pair addressing an object within its kind
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key of an object, using the empty namespace if unset
    pub fn from_resource(obj: &impl ResourceExt) -> Self {
        Self {
            namespace: obj.namespace().unwrap_or_default(),
            name: obj.name_any(),
        }
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// An owner of a managed resource
///
/// Identity key plus the kind of the owner; the reconciler resolves it
/// against the object store, never through an in-memory pointer.
#[derive(Debug, Clone)]
pub struct Owner {
    pub key: ObjectKey,
    pub api_resource: ApiResource,
}

/// Error reported by a driver
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error(transparent)]
    Scaleway(#[from] scaleway::Error),
    #[error(transparent)]
    Kube(#[from] kube::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Driver contract implemented by all RDB resource kinds
#[async_trait]
pub trait Manager<K>: Send + Sync {
    /// Converge the backing cloud resource toward the object's spec.
    ///
    /// Idempotent; may be called repeatedly. Returns `true` once the resource
    /// is fully reconciled; `false` with no error means "in progress, call
    /// again". Observed-state status fields may be written on `obj` as a side
    /// effect.
    async fn ensure(&self, obj: &mut K) -> Result<bool, ManagerError>;

    /// Delete the backing cloud resource.
    ///
    /// Idempotent; a backend "not found" counts as a completed deletion.
    /// Returns `true` once deletion is complete.
    async fn delete(&self, obj: &mut K) -> Result<bool, ManagerError>;

    /// Report the owners of the object. Pure lookup, no side effects.
    async fn get_owners(&self, obj: &K) -> Result<Vec<Owner>, ManagerError>;

    /// Validate the creation of an object (admission path)
    async fn validate_create(&self, _obj: &K) -> Result<FieldErrorList, ManagerError> {
        Ok(Vec::new())
    }

    /// Validate an update of an object (admission path)
    async fn validate_update(&self, _old: &K, _new: &K) -> Result<FieldErrorList, ManagerError> {
        Ok(Vec::new())
    }
}
