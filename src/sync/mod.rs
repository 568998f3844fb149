//! Sync orchestration module
//!
//! This module turns the container list into per-container azcopy
//! invocations, mirroring each container into a local directory of the
//! same name.

pub mod orchestrator;

pub use orchestrator::*;
