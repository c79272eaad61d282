//! # Shared Resource Status
//!
//! Condition bookkeeping embedded in the status of every managed resource.
//!
//! Conditions are looked up by type, never by position; at most one condition
//! per type exists. `lastProbeTime` moves on every pass that touches a
//! condition, while `lastTransitionTime` only moves when the status value
//! actually flips. Age-based alerting relies on that asymmetry.

use chrono::{DateTime, Utc};
use kube::Resource;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Type of a [`Condition`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
pub enum ConditionType {
    /// Reconciled indicates whether the resource was successfully reconciled
    Reconciled,
    /// Ready indicates whether the resource is considered ready
    Ready,
}

/// Status value of a [`Condition`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

/// Condition contains details for the current condition of a managed resource
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of the condition
    pub r#type: ConditionType,
    /// Status of the condition. Can be True, False, Unknown
    pub status: ConditionStatus,
    /// Last time we probed the condition (RFC3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_probe_time: Option<String>,
    /// Last time the condition transitioned from one status to another (RFC3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
    /// Unique, one-word, CamelCase reason for the condition's last transition
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    /// Human-readable message indicating details about the last transition
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl Condition {
    /// Build a condition carrying only the fields the caller decides;
    /// timestamps are filled in by [`Status::update_condition`].
    pub fn new(
        r#type: ConditionType,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            r#type,
            status,
            last_probe_time: None,
            last_transition_time: None,
            reason: reason.into(),
            message: message.into(),
        }
    }
}

/// Observed conditions of a managed resource
///
/// Embedded (flattened) into the status of every CRD handled by the operator.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    /// Conditions is the current conditions of the resource
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl Status {
    /// Returns the condition with the given type, if present
    pub fn condition(&self, r#type: ConditionType) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.r#type == r#type)
    }

    /// Returns true if the Ready condition is True
    pub fn is_ready(&self) -> bool {
        self.condition(ConditionType::Ready)
            .is_some_and(|c| c.status == ConditionStatus::True)
    }

    /// Returns true if the Reconciled condition is True
    pub fn is_reconciled(&self) -> bool {
        self.condition(ConditionType::Reconciled)
            .is_some_and(|c| c.status == ConditionStatus::True)
    }

    /// Returns true if the Reconciled condition is True and last transitioned
    /// after the given instant
    pub fn is_reconciled_after(&self, after: DateTime<Utc>) -> bool {
        self.condition(ConditionType::Reconciled)
            .filter(|c| c.status == ConditionStatus::True)
            .and_then(|c| c.last_transition_time.as_deref())
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .is_some_and(|t| t > after)
    }

    /// Apply a condition to the store.
    ///
    /// An existing condition of the same type gets its probe time, reason and
    /// message refreshed unconditionally; the transition time only moves when
    /// the status value changes. A condition type not seen before is appended
    /// with both timestamps set to `now`.
    pub fn update_condition(&mut self, condition: Condition, now: DateTime<Utc>) {
        let now = now.to_rfc3339();
        for existing in &mut self.conditions {
            if existing.r#type == condition.r#type {
                existing.last_probe_time = Some(now.clone());
                existing.reason = condition.reason;
                existing.message = condition.message;
                if existing.status != condition.status {
                    existing.last_transition_time = Some(now);
                }
                existing.status = condition.status;
                return;
            }
        }
        self.conditions.push(Condition {
            last_probe_time: Some(now.clone()),
            last_transition_time: Some(now),
            ..condition
        });
    }
}

/// A namespaced resource carrying the shared condition container.
///
/// Every CRD handled by the operator implements this; the reconciler only
/// needs identity/metadata (via [`kube::Resource`]) and status access.
pub trait ManagedResource:
    Resource<Scope = k8s_openapi::NamespaceResourceScope, DynamicType = ()>
    + Clone
    + std::fmt::Debug
    + DeserializeOwned
    + Serialize
    + Send
    + Sync
    + 'static
{
    /// Returns a copy of the shared condition status
    fn status(&self) -> Status;
    /// Replaces the shared condition status
    fn set_status(&mut self, status: Status);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn probe(status: &Status) -> (Option<String>, Option<String>) {
        let c = &status.conditions[0];
        (c.last_probe_time.clone(), c.last_transition_time.clone())
    }

    #[test]
    fn new_condition_gets_both_timestamps() {
        let now = Utc::now();
        let mut status = Status::default();
        status.update_condition(
            Condition::new(ConditionType::Ready, ConditionStatus::True, "reason", "message"),
            now,
        );

        assert_eq!(status.conditions.len(), 1);
        let (probe_time, transition_time) = probe(&status);
        assert_eq!(probe_time, Some(now.to_rfc3339()));
        assert_eq!(transition_time, Some(now.to_rfc3339()));
        assert_eq!(status.conditions[0].reason, "reason");
        assert_eq!(status.conditions[0].message, "message");
    }

    #[test]
    fn same_status_only_moves_probe_time() {
        let before = Utc::now() - Duration::seconds(5);
        let now = Utc::now();
        let mut status = Status::default();
        status.update_condition(
            Condition::new(ConditionType::Ready, ConditionStatus::True, "reason", "message"),
            before,
        );
        status.update_condition(
            Condition::new(ConditionType::Ready, ConditionStatus::True, "reason", "message"),
            now,
        );

        let (probe_time, transition_time) = probe(&status);
        assert_eq!(probe_time, Some(now.to_rfc3339()));
        assert_eq!(transition_time, Some(before.to_rfc3339()));
    }

    #[test]
    fn status_flip_moves_transition_time() {
        let before = Utc::now() - Duration::seconds(5);
        let now = Utc::now();
        let mut status = Status::default();
        status.update_condition(
            Condition::new(ConditionType::Ready, ConditionStatus::True, "reason", "message"),
            before,
        );
        status.update_condition(
            Condition::new(ConditionType::Ready, ConditionStatus::False, "reason", "message"),
            now,
        );

        let (probe_time, transition_time) = probe(&status);
        assert_eq!(probe_time, Some(now.to_rfc3339()));
        assert_eq!(transition_time, Some(now.to_rfc3339()));
        assert_eq!(status.conditions[0].status, ConditionStatus::False);
    }

    #[test]
    fn transition_time_tracks_value_changes_only() {
        // True -> True -> False -> False: the transition time moves exactly
        // when the value differs from the previous one.
        let t: Vec<DateTime<Utc>> = (0..4)
            .map(|i| Utc::now() + Duration::seconds(i))
            .collect();
        let sequence = [
            ConditionStatus::True,
            ConditionStatus::True,
            ConditionStatus::False,
            ConditionStatus::False,
        ];

        let mut status = Status::default();
        for (now, value) in t.iter().zip(sequence) {
            status.update_condition(
                Condition::new(ConditionType::Reconciled, value, "", ""),
                *now,
            );
        }

        let (probe_time, transition_time) = probe(&status);
        assert_eq!(probe_time, Some(t[3].to_rfc3339()));
        assert_eq!(transition_time, Some(t[2].to_rfc3339()));
    }

    #[test]
    fn conditions_are_looked_up_by_type() {
        let now = Utc::now();
        let mut status = Status::default();
        status.update_condition(
            Condition::new(ConditionType::Ready, ConditionStatus::True, "", ""),
            now,
        );
        status.update_condition(
            Condition::new(ConditionType::Reconciled, ConditionStatus::False, "", ""),
            now,
        );

        assert_eq!(status.conditions.len(), 2);
        assert!(status.is_ready());
        assert!(!status.is_reconciled());
    }

    #[test]
    fn reconciled_after_compares_transition_time() {
        let before = Utc::now() - Duration::seconds(60);
        let now = Utc::now();
        let mut status = Status::default();
        status.update_condition(
            Condition::new(ConditionType::Reconciled, ConditionStatus::True, "", ""),
            now,
        );

        assert!(status.is_reconciled_after(before));
        assert!(!status.is_reconciled_after(now + Duration::seconds(60)));
    }
}
