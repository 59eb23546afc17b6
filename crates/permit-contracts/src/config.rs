//! Client configuration.
//!
//! `PermissionsOptions` can be built in code or loaded from TOML:
//!
//! ```toml
//! base_url = "https://dashboard.example.com"
//! endpoint = "/api/v1/dashboard/access"
//! application = "reports"
//! timeout_secs = 10
//! ```
//!
//! Every field has a default, but the HTTP transport needs `base_url`: it has
//! no page origin to resolve the endpoint against, so `lookup_url` returns
//! `ConfigError` without one. The checker itself never reads these values;
//! they are forwarded to whichever transport implements the remote authority.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PermitError, PermitResult};

/// Endpoint queried when none is configured.
pub const DEFAULT_ENDPOINT: &str = "/api/v1/dashboard/access";

/// Per-request timeout applied when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Options accepted when constructing a permissions client.
///
/// `base_url` is required by the HTTP transport. `PermissionsOptions::default()`
/// alone is not enough to build one; add `with_base_url` first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PermissionsOptions {
    /// Scheme and host of the remote authority, e.g. `https://api.example.com`.
    /// Required by the HTTP transport.
    pub base_url: Option<String>,

    /// Path appended to `base_url` for every lookup.
    pub endpoint: String,

    /// Sent as the `Application` header on every request when set.
    pub application: Option<String>,

    /// Upper bound on a single lookup round trip. A lookup that runs out of
    /// time counts as a failed lookup.
    pub timeout_secs: u64,
}

impl Default for PermissionsOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            application: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl PermissionsOptions {
    /// Parse `s` as TOML.
    ///
    /// Returns `PermitError::ConfigError` if the TOML is malformed or carries
    /// unknown keys.
    pub fn from_toml_str(s: &str) -> PermitResult<Self> {
        toml::from_str(s).map_err(|e| PermitError::ConfigError {
            reason: format!("failed to parse permissions TOML: {}", e),
        })
    }

    /// Read the file at `path` and parse it as TOML.
    pub fn from_file(path: &Path) -> PermitResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| PermitError::ConfigError {
            reason: format!("failed to read permissions file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_application(mut self, application: impl Into<String>) -> Self {
        self.application = Some(application.into());
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The full lookup URL: `base_url` without a trailing slash, then `endpoint`.
    ///
    /// Returns `PermitError::ConfigError` when no base URL is configured.
    pub fn lookup_url(&self) -> PermitResult<String> {
        let base = self
            .base_url
            .as_deref()
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| PermitError::ConfigError {
                reason: "base_url is required to reach the remote authority".to_string(),
            })?;

        let endpoint = if self.endpoint.is_empty() {
            DEFAULT_ENDPOINT
        } else {
            self.endpoint.as_str()
        };

        let base = base.trim_end_matches('/');
        if endpoint.starts_with('/') {
            Ok(format!("{}{}", base, endpoint))
        } else {
            Ok(format!("{}/{}", base, endpoint))
        }
    }
}
