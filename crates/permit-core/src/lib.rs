//! # permit-core
//!
//! The caching, request-deduplicating permission checker.
//!
//! This crate provides:
//! - The `RemoteAuthority` trait, the seam to whatever backend decides
//! - The `PermissionChecker` that sits in front of it
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use permit_core::PermissionChecker;
//!
//! let checker = PermissionChecker::new(Arc::new(authority));
//! if checker.can("report:edit").await { /* ... */ }
//! if checker.can(["report:edit", "report:admin"]).await { /* ... */ }
//! ```

pub mod checker;
pub mod traits;

pub use checker::{PermissionChecker, ACTION_PARAMETER};
pub use traits::RemoteAuthority;
