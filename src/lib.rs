//! blobsync - Storage Account Mirror Tool
//!
//! Authenticates to Azure Key Vault with a certificate-backed service
//! principal, retrieves a SAS connection string secret, enumerates the
//! storage account's containers and mirrors each one to a local directory
//! by invoking azcopy.

pub mod auth;
pub mod cert;
pub mod cli;
pub mod error;
pub mod storage;
pub mod sync;
pub mod utils;
pub mod vault;

// Re-export commonly used types
pub use error::{Result, SyncError};
