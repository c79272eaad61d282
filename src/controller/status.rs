//! # Status Classification
//!
//! Maps an Ensure outcome onto the Reconciled condition and a retry schedule.
//!
//! Classified errors are expected operational states of the cloud backend:
//! they are recorded in status and consumed here, never surfaced as pass
//! failures. Unclassified errors are handed back to the caller so its generic
//! backoff and logging apply.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::constants::{
    MESSAGE_STILL_RECONCILING, REASON_INVALID_ARGUMENTS, REASON_OUT_OF_STOCK,
    REASON_PERMISSIONS_DENIED, REASON_QUOTAS_EXCEEDED, REASON_RECONCILING,
    REASON_RESOURCE_LOCKED, REASON_RESOURCE_NOT_FOUND, REASON_TRANSIENT_STATE,
};
use crate::crd::meta::{Condition, ConditionStatus, ConditionType, Status};
use crate::manager::ManagerError;
use crate::scaleway;

/// Retry schedule attached to a classified driver error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Condition reason recorded on the object
    pub reason: &'static str,
    /// Requeue delay as a multiple of the base interval; `None` requests no
    /// requeue
    pub requeue_multiplier: Option<u32>,
}

/// Classify a driver error into its retry policy
///
/// Returns `None` for unclassified errors, which must be propagated to the
/// caller instead of being consumed.
pub fn classify(err: &ManagerError) -> Option<RetryPolicy> {
    let ManagerError::Scaleway(err) = err else {
        return None;
    };

    let policy = match err {
        scaleway::Error::ResourceNotFound { .. } => RetryPolicy {
            reason: REASON_RESOURCE_NOT_FOUND,
            requeue_multiplier: None,
        },
        scaleway::Error::InvalidArguments { .. } => RetryPolicy {
            reason: REASON_INVALID_ARGUMENTS,
            requeue_multiplier: None,
        },
        scaleway::Error::PermissionsDenied { .. } => RetryPolicy {
            reason: REASON_PERMISSIONS_DENIED,
            requeue_multiplier: Some(10),
        },
        scaleway::Error::OutOfStock { .. } => RetryPolicy {
            reason: REASON_OUT_OF_STOCK,
            requeue_multiplier: Some(4),
        },
        scaleway::Error::QuotasExceeded { .. } => RetryPolicy {
            reason: REASON_QUOTAS_EXCEEDED,
            requeue_multiplier: Some(2),
        },
        scaleway::Error::ResourceLocked { .. } => RetryPolicy {
            reason: REASON_RESOURCE_LOCKED,
            requeue_multiplier: Some(10),
        },
        scaleway::Error::TransientState { .. } => RetryPolicy {
            reason: REASON_TRANSIENT_STATE,
            requeue_multiplier: Some(1),
        },
        _ => return None,
    };

    Some(policy)
}

/// Derive the Reconciled condition and a requeue delay from an Ensure outcome.
///
/// Returns the requested requeue delay and the residual error: classified
/// errors are consumed here, unclassified ones are handed back.
pub fn update_status(
    status: &mut Status,
    now: DateTime<Utc>,
    ensure_err: Option<ManagerError>,
    reconciled: bool,
    requeue_duration: Duration,
) -> (Option<Duration>, Option<ManagerError>) {
    let mut condition_status = ConditionStatus::True;
    let mut reason = "";
    let mut message = String::new();
    let mut requeue_after = None;
    let mut residual = None;

    if let Some(err) = ensure_err {
        message = err.to_string();
        condition_status = ConditionStatus::False;
        match classify(&err) {
            Some(policy) => {
                reason = policy.reason;
                requeue_after = policy
                    .requeue_multiplier
                    .map(|multiplier| requeue_duration * multiplier);
            }
            None => residual = Some(err),
        }
    } else if !reconciled {
        condition_status = ConditionStatus::False;
        reason = REASON_RECONCILING;
        message = MESSAGE_STILL_RECONCILING.to_string();
        requeue_after = Some(requeue_duration);
    }

    status.update_condition(
        Condition::new(ConditionType::Reconciled, condition_status, reason, message),
        now,
    );

    (requeue_after, residual)
}
