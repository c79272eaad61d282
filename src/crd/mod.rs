//! # Custom Resource Definitions
//!
//! CRD types for the RDB operator.
//!
//! ## Module Structure
//!
//! - `meta.rs` - Shared condition container and the [`ManagedResource`] trait
//! - `instance.rs` - `RDBInstance` (a managed database instance)
//! - `database.rs` - `RDBDatabase` (a logical database on an instance)
//! - `user.rs` - `RDBUser` (a database user on an instance)

pub mod meta;

mod database;
mod instance;
mod user;

pub use database::{RDBDatabase, RDBDatabaseSpec, RDBDatabaseStatus};
pub use instance::{
    RDBInstance, RDBInstanceAutoBackup, RDBInstanceEndpoint, RDBInstanceRef, RDBInstanceSpec,
    RDBInstanceStatus, RDBACL, RDBACLRule,
};
pub use meta::{Condition, ConditionStatus, ConditionType, ManagedResource};
pub use user::{
    RDBPermission, RDBPrivilege, RDBUser, RDBUserPassword, RDBUserPasswordSecretRef, RDBUserSpec,
    RDBUserStatus,
};
