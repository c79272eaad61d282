//! # Reconciliation Core
//!
//! The generic control loop shared by all RDB resources.
//!
//! ## Module Structure
//!
//! - `store.rs` - Object store and event sink seams plus their kube-backed impls
//! - `status.rs` - Error classification and the Reconciled condition update
//! - `owners.rs` - Controller-owner linking
//! - `reconcile.rs` - The reconciliation pass itself
//! - `run.rs` - Watch loop wiring one controller per resource kind

mod owners;
mod reconcile;
mod run;
mod status;
mod store;

pub use reconcile::{Error, Reconciler};
pub use run::run_controller;
pub use status::{classify, update_status, RetryPolicy};
pub use store::{EventSink, KubeEvents, KubeStore, ObjectStore};
