//! Authentication module for Azure services
//!
//! This module provides bearer token acquisition for a service principal
//! against an identity authority, using either a certificate client
//! assertion or a shared client secret.

pub mod provider;

pub use provider::*;
