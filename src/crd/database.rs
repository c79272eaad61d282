//! # RDBDatabase
//!
//! CRD for a logical database living on an RDB instance.

use serde::{Deserialize, Serialize};

use crate::crd::instance::RDBInstanceRef;
use crate::crd::meta::{self, ManagedResource};

/// RDBDatabase Custom Resource Definition
///
/// Declares a logical database on an RDB instance, referenced either by an
/// `RDBInstance` object (name/namespace) or directly by Scaleway ID
/// (externalID/region).
#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "RDBDatabase",
    group = "rdb.scaleway.com",
    version = "v1alpha1",
    namespaced,
    status = "RDBDatabaseStatus",
    shortname = "rdbd",
    printcolumn = r#"{"name":"Size", "type":"string", "jsonPath":".status.size"}"#,
    printcolumn = r#"{"name":"Owner", "type":"string", "jsonPath":".status.owner"}"#,
    printcolumn = r#"{"name":"Managed", "type":"string", "jsonPath":".status.managed"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct RDBDatabaseSpec {
    /// InstanceRef represents the reference to the instance of the database
    pub instance_ref: RDBInstanceRef,
    /// OverrideName represents the name given to the database
    /// If empty, the object name is used
    /// This field is immutable after creation
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub override_name: String,
}

/// Observed state of an RDBDatabase
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RDBDatabaseStatus {
    /// Size represents the size of the database, in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Managed defines whether this database is managed by Scaleway
    #[serde(default)]
    pub managed: bool,
    /// Owner represents the owner of this database
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub owner: String,
    /// Conditions is the current conditions of the database
    #[serde(flatten)]
    pub meta: meta::Status,
}

impl ManagedResource for RDBDatabase {
    fn status(&self) -> meta::Status {
        self.status
            .as_ref()
            .map(|s| s.meta.clone())
            .unwrap_or_default()
    }

    fn set_status(&mut self, status: meta::Status) {
        self.status.get_or_insert_with(RDBDatabaseStatus::default).meta = status;
    }
}
