//! # RDBUser
//!
//! CRD for a database user on an RDB instance.

use serde::{Deserialize, Serialize};

use crate::crd::instance::RDBInstanceRef;
use crate::crd::meta::{self, ManagedResource};

/// RDBUser Custom Resource Definition
///
/// Declares a database user on an RDB instance. The password is taken from a
/// literal value or from a Kubernetes Secret.
#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "RDBUser",
    group = "rdb.scaleway.com",
    version = "v1alpha1",
    namespaced,
    status = "RDBUserStatus",
    shortname = "rdbu",
    printcolumn = r#"{"name":"UserName", "type":"string", "jsonPath":".spec.userName"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct RDBUserSpec {
    /// UserName is the user name to be created on the instance
    pub user_name: String,
    /// Password is the password associated to the user
    pub password: RDBUserPassword,
    /// Admin represents whether the user is an admin user
    /// Default: true
    #[serde(default = "default_true")]
    pub admin: bool,
    /// Privileges represents the privileges given to this user
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub privileges: Vec<RDBPrivilege>,
    /// InstanceRef represents the reference to the instance of the user
    pub instance_ref: RDBInstanceRef,
}

/// Default value for the admin flag
fn default_true() -> bool {
    true
}

/// Privilege linked to an RDBUser
#[derive(Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RDBPrivilege {
    /// DatabaseName is the name of the RDB database for this privilege
    pub database_name: String,
    /// Permission is the permission given for this privilege
    pub permission: RDBPermission,
}

/// Permission of a privilege
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
pub enum RDBPermission {
    ReadOnly,
    ReadWrite,
    All,
    None,
}

/// Password of an RDBUser
///
/// One of value or valueFrom must be specified.
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RDBUserPassword {
    /// Value represents a raw password value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// ValueFrom represents a password taken from a secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_from: Option<RDBUserPasswordSecretRef>,
}

/// Secret reference holding a user password
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RDBUserPasswordSecretRef {
    /// Name of the secret
    pub name: String,
    /// Namespace of the secret
    pub namespace: String,
}

/// Observed state of an RDBUser
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RDBUserStatus {
    /// Conditions is the current conditions of the user
    #[serde(flatten)]
    pub meta: meta::Status,
}

impl ManagedResource for RDBUser {
    fn status(&self) -> meta::Status {
        self.status
            .as_ref()
            .map(|s| s.meta.clone())
            .unwrap_or_default()
    }

    fn set_status(&mut self, status: meta::Status) {
        self.status.get_or_insert_with(RDBUserStatus::default).meta = status;
    }
}
