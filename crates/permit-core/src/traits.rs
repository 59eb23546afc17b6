//! The trust boundary between the checker and whoever decides permissions.
//!
//! The checker never evaluates a permission itself. It relays an opaque
//! action value to a `RemoteAuthority` and reports back the boolean the
//! authority answers with.

use async_trait::async_trait;

use permit_contracts::{access::AccessResponse, error::PermitResult};

/// A backend that answers "is this action allowed?".
///
/// Implementations perform exactly one round trip per call and must not
/// cache: caching and deduplication are the checker's job.
#[async_trait]
pub trait RemoteAuthority: Send + Sync {
    /// Ask whether `value` is allowed, sending it under `parameter`.
    ///
    /// `value` is either a single action token or a JSON array of tokens.
    /// Return `Err` for transport or protocol failures; a well-formed answer
    /// without an `allowed` flag is `Ok` with `allowed = None`.
    async fn query(&self, parameter: &str, value: &str) -> PermitResult<AccessResponse>;
}
