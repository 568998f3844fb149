//! Key Vault module
//!
//! This module provides the read-only secret client used to fetch the SAS
//! connection string, including the bearer-challenge handshake that tells
//! us which authority and resource to authenticate against.

pub mod client;

pub use client::*;
