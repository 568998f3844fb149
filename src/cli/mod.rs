//! CLI module for blobsync
//!
//! This module contains the command-line definition and the linear
//! pipeline it drives: certificate lookup, token acquisition, secret
//! retrieval, container listing and per-container sync.

pub mod commands;

pub use commands::*;
