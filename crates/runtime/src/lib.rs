//! OS process lifecycle for the mail application driven by `olsend`.
//!
//! The application session snapshots processes around a launch to find the
//! one it started, and later waits for that exact process to exit.

pub mod fake;
pub mod process;

pub use process::{ProcessRef, ProcessTable, SystemProcessTable, name_matches, spawned_process};
