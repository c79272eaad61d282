//! # RDBInstance
//!
//! CRD for a managed Scaleway Database instance.

use serde::{Deserialize, Serialize};

use crate::crd::meta::{self, ManagedResource};

/// RDBInstance Custom Resource Definition
///
/// Declares a managed Scaleway Database instance. The operator creates the
/// backing instance (or adopts an existing one via `instanceID`), then keeps
/// tags, backup schedule, HA mode, node type and ACL rules converged with
/// this spec.
///
/// # Example
///
/// ```yaml
/// apiVersion: rdb.scaleway.com/v1alpha1
/// kind: RDBInstance
/// metadata:
///   name: my-instance
///   namespace: default
/// spec:
///   engine: PostgreSQL-14
///   nodeType: db-dev-s
///   isHaCluster: false
/// ```
#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "RDBInstance",
    group = "rdb.scaleway.com",
    version = "v1alpha1",
    namespaced,
    status = "RDBInstanceStatus",
    shortname = "rdbi",
    printcolumn = r#"{"name":"IP", "type":"string", "jsonPath":".status.endpoint.ip"}"#,
    printcolumn = r#"{"name":"Port", "type":"integer", "jsonPath":".status.endpoint.port"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct RDBInstanceSpec {
    /// InstanceID is the ID of the instance
    /// If empty a new instance is created; if set this instance is adopted
    /// This field is immutable after creation
    /// At most one of instanceID/region and instanceFrom can be specified on creation
    #[serde(rename = "instanceID", default, skip_serializing_if = "String::is_empty")]
    pub instance_id: String,
    /// Region is the region in which the instance runs
    /// This field is immutable after creation
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub region: String,
    /// InstanceFrom allows creating an instance as a clone of an existing one
    /// At most one of instanceID/region and instanceFrom can be specified on creation
    /// This field is immutable after creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_from: Option<RDBInstanceRef>,
    /// Engine is the database engine of the instance (e.g. "PostgreSQL-14")
    pub engine: String,
    /// NodeType is the type of node to use for the instance
    pub node_type: String,
    /// IsHaCluster represents whether the instance should run in HA mode
    /// Default: false
    #[serde(default)]
    pub is_ha_cluster: bool,
    /// AutoBackup represents the instance auto backup policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_backup: Option<RDBInstanceAutoBackup>,
    /// ACL represents the ACL rules of the instance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acl: Option<RDBACL>,
}

/// Reference to an RDB instance
///
/// Only one of externalID/region or name/namespace must be specified.
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RDBInstanceRef {
    /// ExternalID is the Scaleway ID of the instance
    /// This field is immutable after creation
    #[serde(rename = "externalID", default, skip_serializing_if = "String::is_empty")]
    pub external_id: String,
    /// Region is the region of the instance
    /// This field is immutable after creation
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub region: String,
    /// Name is the name of the RDBInstance object
    /// This field is immutable after creation
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Namespace is the namespace of the RDBInstance object
    /// If empty, the namespace of the referencing object is used
    /// This field is immutable after creation
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

/// ACL of an RDB instance
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RDBACL {
    /// Rules represents the ACL rules
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<RDBACLRule>,
    /// AllowCluster represents whether the nodes of the cluster should be allowed
    #[serde(default)]
    pub allow_cluster: bool,
}

/// A single ACL rule
#[derive(Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RDBACLRule {
    /// IPRange represents a CIDR IP range
    pub ip_range: String,
    /// Description is the description associated with this ACL rule
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Auto backup policy of an RDB instance
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RDBInstanceAutoBackup {
    /// Disabled represents whether auto backup should be disabled
    #[serde(default)]
    pub disabled: bool,
    /// Frequency represents the frequency, in hours, at which auto backups are made
    /// Default: 24
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<u32>,
    /// Retention represents the number of days auto backups are kept
    /// Default: 7
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention: Option<u32>,
}

/// Observed state of an RDBInstance
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RDBInstanceStatus {
    /// Endpoint is the endpoint of the instance
    #[serde(default)]
    pub endpoint: RDBInstanceEndpoint,
    /// Conditions is the current conditions of the instance
    #[serde(flatten)]
    pub meta: meta::Status,
}

/// Endpoint of an RDB instance
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RDBInstanceEndpoint {
    /// IP is the IP of the instance
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ip: String,
    /// Port is the port of the instance
    #[serde(default)]
    pub port: i32,
}

impl ManagedResource for RDBInstance {
    fn status(&self) -> meta::Status {
        self.status
            .as_ref()
            .map(|s| s.meta.clone())
            .unwrap_or_default()
    }

    fn set_status(&mut self, status: meta::Status) {
        self.status.get_or_insert_with(RDBInstanceStatus::default).meta = status;
    }
}
