//! # Owner Linking
//!
//! Records a controller-owner relationship between a managed object and the
//! first fetchable owner candidate its driver reports. Best effort: not
//! finding any owner is normal (most resources are unowned), and failures on
//! individual candidates never fail the pass.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::Resource;
use tracing::{debug, info, warn};

use crate::crd::ManagedResource;
use crate::manager::Owner;

use super::store::ObjectStore;

/// Link `obj` to the first fetchable owner candidate and persist the result
pub(crate) async fn link_owners<K: ManagedResource>(
    store: &dyn ObjectStore<K>,
    obj: &mut K,
    owners: &[Owner],
) {
    for owner in owners {
        let owner_ref = match store.resolve_owner(owner).await {
            Ok(owner_ref) => owner_ref,
            Err(err) => {
                debug!("could not fetch owner {}: {err}", owner.key);
                continue;
            }
        };

        if let Err(err) = set_controller_reference(obj, owner_ref) {
            warn!("failed to set controller reference: {err}");
            continue;
        }

        match store.update(obj).await {
            Ok(updated) => {
                *obj = updated;
                info!("controller reference set");
                break;
            }
            Err(err) => {
                warn!("failed to update controller reference: {err}");
                continue;
            }
        }
    }
}

/// Set `owner_ref` as the controlling owner of `obj`.
///
/// Re-setting the same controller is a no-op; an existing controller of a
/// different object is an error.
fn set_controller_reference<K: ManagedResource>(
    obj: &mut K,
    owner_ref: OwnerReference,
) -> anyhow::Result<()> {
    let owner_refs = obj.meta_mut().owner_references.get_or_insert_with(Vec::new);

    if let Some(existing) = owner_refs.iter().find(|r| r.controller == Some(true)) {
        if existing.uid == owner_ref.uid {
            return Ok(());
        }
        anyhow::bail!(
            "object is already controlled by {} {}",
            existing.kind,
            existing.name
        );
    }

    owner_refs.push(owner_ref);
    Ok(())
}
