//! `reqwest`-backed implementation of `RemoteAuthority`.
//!
//! Request shape:
//!
//!   GET {base_url}{endpoint}?action=<value>
//!   Application: <application>        (only when configured)
//!
//! Response shape: `{ "allowed": bool }`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use tracing::{debug, warn};

use permit_contracts::{
    access::AccessResponse,
    config::PermissionsOptions,
    error::{PermitError, PermitResult},
};
use permit_core::traits::RemoteAuthority;

/// Header carrying the configured application identifier.
pub const APPLICATION_HEADER: &str = "application";

/// Asks a dashboard-style HTTP endpoint whether an action is allowed.
#[derive(Debug, Clone)]
pub struct HttpAuthority {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpAuthority {
    /// Build an authority from `options`.
    ///
    /// Returns `PermitError::ConfigError` when the base URL is missing or not
    /// a valid URL, or when the application name cannot be sent as a header.
    pub fn new(options: &PermissionsOptions) -> PermitResult<Self> {
        let url = options.lookup_url()?;
        reqwest::Url::parse(&url).map_err(|e| PermitError::ConfigError {
            reason: format!("invalid lookup URL '{}': {}", url, e),
        })?;

        let mut headers = HeaderMap::new();
        if let Some(application) = &options.application {
            let value = HeaderValue::from_str(application).map_err(|e| PermitError::ConfigError {
                reason: format!("application '{}' is not a valid header value: {}", application, e),
            })?;
            headers.insert(HeaderName::from_static(APPLICATION_HEADER), value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| PermitError::ConfigError {
                reason: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            url,
            timeout: options.timeout(),
        })
    }

    /// The full URL every lookup is sent to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RemoteAuthority for HttpAuthority {
    async fn query(&self, parameter: &str, value: &str) -> PermitResult<AccessResponse> {
        debug!(url = %self.url, parameter, value, "sending permission lookup");

        let response = self
            .client
            .get(&self.url)
            .query(&[(parameter, value)])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| PermitError::Transport {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %self.url, status = status.as_u16(), "remote authority rejected lookup");
            return Err(PermitError::Status {
                status: status.as_u16(),
            });
        }

        let body: serde_json::Value =
            response
                .json()
                .await
                .map_err(|e| PermitError::MalformedBody {
                    reason: e.to_string(),
                })?;

        Ok(AccessResponse::from_json(&body))
    }
}
