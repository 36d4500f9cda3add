//! Sync engine.
//!
//! Decides, per file, whether to transfer and in which direction, then
//! executes the transfers through the device bridge and accounts for them.

pub mod backup;
pub mod classify;
pub mod engine;
pub mod mtime;
pub mod policy;

pub use engine::{SyncEngine, SyncJob, SyncMode, SyncPlan, SyncSummary, SyncTarget};
pub use policy::{SyncDirection, TransferAction};
