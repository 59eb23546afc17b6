//! # permit-contracts
//!
//! Shared types, configuration, and contracts for the PERMIT client.
//!
//! All crates in the workspace import from here. No lookup logic lives in
//! this crate, only data definitions, canonicalization, and error types.

pub mod access;
pub mod action;
pub mod config;
pub mod error;

pub use access::AccessResponse;
pub use action::{ActionIdentifier, CacheKey};
pub use config::PermissionsOptions;
pub use error::{PermitError, PermitResult};
