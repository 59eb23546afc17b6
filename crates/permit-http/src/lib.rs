//! # permit-http
//!
//! HTTP transport for the PERMIT client.
//!
//! [`HttpAuthority`] implements [`RemoteAuthority`](permit_core::traits::RemoteAuthority)
//! over `reqwest`, and [`setup_permissions`] wires it into a ready-to-use
//! [`PermissionChecker`].
//!
//! ```rust,ignore
//! use permit_contracts::PermissionsOptions;
//!
//! let checker = permit_http::setup_permissions(
//!     PermissionsOptions::default()
//!         .with_base_url("https://dashboard.example.com")
//!         .with_application("reports"),
//! )?;
//! let allowed = checker.can("report:edit").await;
//! ```

pub mod authority;

use std::sync::Arc;

use tracing::info;

use permit_contracts::{config::PermissionsOptions, error::PermitResult};
use permit_core::PermissionChecker;

pub use authority::{HttpAuthority, APPLICATION_HEADER};

/// Build a `PermissionChecker` backed by an `HttpAuthority`.
///
/// Returns `PermitError::ConfigError` if `options` cannot produce a valid
/// HTTP client.
pub fn setup_permissions(options: PermissionsOptions) -> PermitResult<PermissionChecker> {
    let authority = HttpAuthority::new(&options)?;
    info!(
        url = %authority.url(),
        application = options.application.as_deref().unwrap_or("-"),
        "permissions client configured"
    );
    Ok(PermissionChecker::new(Arc::new(authority)))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
