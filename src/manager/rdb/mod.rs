//! # RDB Drivers
//!
//! One driver per RDB resource kind, all speaking to the RDB product API.

mod database;
mod instance;
mod user;

pub use database::DatabaseManager;
pub use instance::InstanceManager;
pub use user::UserManager;

use kube::api::Api;
use kube::core::ApiResource;

use crate::crd::{RDBInstance, RDBInstanceRef};
use crate::manager::{ManagerError, ObjectKey, Owner};

/// Resolve an instance reference to a (Scaleway instance ID, region) pair.
///
/// A name/namespace reference is resolved through the referenced
/// `RDBInstance` object; an externalID/region reference is used as-is.
pub(crate) async fn resolve_instance_ref(
    client: &kube::Client,
    reference: &RDBInstanceRef,
    fallback_namespace: &str,
) -> Result<(String, String), ManagerError> {
    if !reference.name.is_empty() {
        let namespace = if reference.namespace.is_empty() {
            fallback_namespace
        } else {
            &reference.namespace
        };
        let api: Api<RDBInstance> = Api::namespaced(client.clone(), namespace);
        let instance = api.get(&reference.name).await?;
        return Ok((instance.spec.instance_id.clone(), instance.spec.region.clone()));
    }

    Ok((reference.external_id.clone(), reference.region.clone()))
}

/// Owner candidates for an object referencing an instance by name.
///
/// External references have no owning object.
pub(crate) async fn instance_owner(
    client: &kube::Client,
    reference: &RDBInstanceRef,
    fallback_namespace: &str,
) -> Result<Vec<Owner>, ManagerError> {
    if reference.name.is_empty() {
        return Ok(Vec::new());
    }

    let namespace = if reference.namespace.is_empty() {
        fallback_namespace
    } else {
        &reference.namespace
    };
    let api: Api<RDBInstance> = Api::namespaced(client.clone(), namespace);
    let instance = api.get(&reference.name).await?;

    Ok(vec![Owner {
        key: ObjectKey::from_resource(&instance),
        api_resource: ApiResource::erase::<RDBInstance>(&()),
    }])
}

/// Validate the shape of an instance reference: exactly one of
/// name/namespace or externalID/region.
pub(crate) fn validate_instance_ref(
    reference: &RDBInstanceRef,
    field: &str,
) -> crate::manager::FieldErrorList {
    use crate::manager::FieldError;

    let by_name = !reference.name.is_empty() || !reference.namespace.is_empty();
    let by_id = !reference.external_id.is_empty() || !reference.region.is_empty();

    if reference.name.is_empty() && reference.external_id.is_empty() {
        return vec![FieldError::required(
            field,
            "name/namespace or externalID/region must be specified",
        )];
    }
    if by_name && by_id {
        return vec![FieldError::forbidden(
            field,
            "only one of name/namespace and externalID/region must be specified",
        )];
    }

    Vec::new()
}
