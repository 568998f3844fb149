//! Certificate store module
//!
//! This module provides lookup of service principal certificates by
//! thumbprint from a local PEM directory store, replacing the platform
//! certificate store with an injectable provider.

pub mod store;

pub use store::*;
