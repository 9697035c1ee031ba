//! Core pipeline orchestration for kbsync.
//!
//! This crate ties the client and shared settings together into the
//! end-to-end `sync` workflow.

pub mod pipeline;

pub use pipeline::{ProgressReporter, SilentProgress, SyncReport, run_sync};
