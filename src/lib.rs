//! azsnap: Batch VM Disk Snapshot Operator Console
//!
//! Creates, validates and bulk-deletes VM disk snapshots by driving the cloud CLI as
//! an external process. Per-item work runs on a bounded async pool; outcomes are
//! folded per subscription; delete locks are lifted only for the duration of a
//! deletion pass and always restored.

pub mod aggregate;
pub mod cli;
pub mod cloud;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod journal;
pub mod locks;
pub mod logging;
pub mod outcome;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod resource;
pub mod workers;
