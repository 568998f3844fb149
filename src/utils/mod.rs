//! Utility functions module

pub mod network;

pub use network::*;
