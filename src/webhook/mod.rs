//! # Admission Webhooks
//!
//! Validating admission endpoints, one per resource kind, reusing the same
//! driver instances as the reconcilers. Creation maps to `validate_create`,
//! updates to `validate_update`; everything else is allowed.
//!
//! TLS is terminated in front of this server by the deployment.

mod validate;

pub use validate::handle_admission;

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use kube::core::admission::AdmissionReview;
use kube::core::DynamicObject;
use kube::Resource;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::crd::{ManagedResource, RDBDatabase, RDBInstance, RDBUser};
use crate::manager::Manager;

/// Path of the validating webhook for a group/version/kind
pub fn generate_validate_path(group: &str, version: &str, kind: &str) -> String {
    format!(
        "/validate-{}-{}-{}",
        group.replace('.', "-"),
        version,
        kind.to_lowercase()
    )
}

fn validate_path<K: ManagedResource>() -> String {
    generate_validate_path(&K::group(&()), &K::version(&()), &K::kind(&()))
}

async fn admission_handler<K: ManagedResource>(
    State(manager): State<Arc<dyn Manager<K>>>,
    Json(review): Json<AdmissionReview<K>>,
) -> Json<AdmissionReview<DynamicObject>> {
    Json(handle_admission(manager.as_ref(), review).await)
}

fn kind_router<K: ManagedResource>(manager: Arc<dyn Manager<K>>) -> Router {
    Router::new()
        .route(&validate_path::<K>(), post(admission_handler::<K>))
        .with_state(manager)
}

/// Router serving the validating webhooks of all RDB kinds
pub fn router(
    instances: Arc<dyn Manager<RDBInstance>>,
    databases: Arc<dyn Manager<RDBDatabase>>,
    users: Arc<dyn Manager<RDBUser>>,
) -> Router {
    Router::new()
        .merge(kind_router(instances))
        .merge(kind_router(databases))
        .merge(kind_router(users))
        .layer(TraceLayer::new_for_http())
}

/// Serve the admission router
pub async fn start_webhook_server(addr: &str, router: Router) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("admission webhook server listening on {addr}");
    axum::serve(listener, router).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_validate_path_dashes_the_group() {
        let cases = [
            (("foo", "v2", "bar"), "/validate-foo-v2-bar"),
            (
                ("my-awesome-group", "v99", "MyNiceKind"),
                "/validate-my-awesome-group-v99-mynicekind",
            ),
            (
                ("rdb.scaleway.com", "v1alpha1", "RDBInstance"),
                "/validate-rdb-scaleway-com-v1alpha1-rdbinstance",
            ),
        ];

        for ((group, version, kind), expected) in cases {
            assert_eq!(generate_validate_path(group, version, kind), expected);
        }
    }
}
