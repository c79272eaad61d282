//! # Constants
//!
//! Shared constants used throughout the operator.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Finalizer owned by this operator
///
/// Its presence on an object marks that the operator has taken ownership of
/// cleaning up the backing Scaleway resource.
pub const FINALIZER_NAME: &str = "scaleway.com/finalizer";

/// Annotation suspending reconciliation for an object
///
/// A case-insensitive value of `"true"` stops all Scaleway API interaction
/// for the object while still honoring finalizer bookkeeping on deletion.
pub const IGNORE_ANNOTATION: &str = "scaleway.com/ignore";

/// Message used while a resource is converging
pub const MESSAGE_STILL_RECONCILING: &str = "Still reconciling";

/// Condition reasons written by the reconciler
pub const REASON_RECONCILING: &str = "Reconciling";
pub const REASON_TRANSIENT_STATE: &str = "TransientState";
pub const REASON_RESOURCE_NOT_FOUND: &str = "ResourceNotFound";
pub const REASON_PERMISSIONS_DENIED: &str = "PermissionsDenied";
pub const REASON_OUT_OF_STOCK: &str = "OutOfStock";
pub const REASON_QUOTAS_EXCEEDED: &str = "QuotasExceeded";
pub const REASON_RESOURCE_LOCKED: &str = "ResourceLocked";
pub const REASON_INVALID_ARGUMENTS: &str = "InvalidArguments";

/// Default base requeue interval (seconds)
///
/// All classified retry delays are multiples of this value.
pub const DEFAULT_REQUEUE_SECS: u64 = 30;

/// Default requeue interval after an unclassified reconciliation error (seconds)
pub const DEFAULT_ERROR_REQUEUE_SECS: u64 = 60;

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// Default HTTP server port for the admission webhooks
pub const DEFAULT_WEBHOOK_PORT: u16 = 9443;

/// Default Scaleway API endpoint
pub const DEFAULT_SCALEWAY_API_URL: &str = "https://api.scaleway.com";
