//! # Scaleway RDB Wire Types
//!
//! Request and response bodies of the RDB product API.

use serde::{Deserialize, Serialize};

/// State of an instance as reported by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    Ready,
    Provisioning,
    Configuring,
    Deleting,
    Error,
    Autohealing,
    Locked,
    Initializing,
    DiskFull,
    Backuping,
    Snapshotting,
    Restarting,
    #[serde(other)]
    Unknown,
}

/// A database instance
#[derive(Debug, Clone, Deserialize)]
pub struct Instance {
    pub id: String,
    pub name: String,
    pub status: InstanceStatus,
    pub engine: String,
    pub node_type: String,
    #[serde(default)]
    pub is_ha_cluster: bool,
    pub region: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub endpoint: Option<Endpoint>,
    #[serde(default)]
    pub backup_schedule: Option<BackupSchedule>,
}

/// Network endpoint of an instance
#[derive(Debug, Clone, Deserialize)]
pub struct Endpoint {
    pub ip: String,
    pub port: u16,
}

/// Automated backup policy of an instance
#[derive(Debug, Clone, Deserialize)]
pub struct BackupSchedule {
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub frequency: u32,
    #[serde(default)]
    pub retention: u32,
}

/// A logical database on an instance
#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    pub name: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub managed: bool,
    #[serde(default)]
    pub size: u64,
}

/// A database user on an instance
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub name: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// An ACL rule attached to an instance
#[derive(Debug, Clone, Deserialize)]
pub struct AclRule {
    pub ip: String,
    #[serde(default)]
    pub description: String,
}

/// A supported database engine with its versions
#[derive(Debug, Clone, Deserialize)]
pub struct Engine {
    pub name: String,
    #[serde(default)]
    pub versions: Vec<EngineVersion>,
}

/// A version of a database engine
#[derive(Debug, Clone, Deserialize)]
pub struct EngineVersion {
    pub name: String,
    #[serde(default)]
    pub disabled: bool,
}

/// A node type an instance can run on
#[derive(Debug, Clone, Deserialize)]
pub struct NodeType {
    pub name: String,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListInstancesResponse {
    #[serde(default)]
    pub instances: Vec<Instance>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListDatabasesResponse {
    #[serde(default)]
    pub databases: Vec<Database>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListUsersResponse {
    #[serde(default)]
    pub users: Vec<User>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListAclRulesResponse {
    #[serde(default)]
    pub rules: Vec<AclRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListEnginesResponse {
    #[serde(default)]
    pub engines: Vec<Engine>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListNodeTypesResponse {
    #[serde(default)]
    pub node_types: Vec<NodeType>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateInstanceRequest {
    pub name: String,
    pub engine: String,
    pub node_type: String,
    pub is_ha_cluster: bool,
    pub disable_backup: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CloneInstanceRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateInstanceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_backup_schedule_disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_schedule_frequency: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_schedule_retention: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpgradeInstanceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_ha: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateDatabaseRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub password: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetAclRulesRequest {
    pub rules: Vec<AclRuleRequest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AclRuleRequest {
    pub ip: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}
