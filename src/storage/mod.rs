//! Storage account module
//!
//! This module parses the SAS connection string retrieved from the vault
//! and enumerates the account's blob containers through the paginated
//! List Containers REST operation.

pub mod account;
pub mod list;

pub use account::*;
pub use list::*;
