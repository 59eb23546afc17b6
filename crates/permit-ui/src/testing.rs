//! Shared fixtures for this crate's tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use permit_contracts::{access::AccessResponse, error::PermitResult};
use permit_core::{PermissionChecker, RemoteAuthority};

use crate::directive::Displayable;

/// Allows exactly the listed query values and counts every lookup.
pub(crate) struct StaticAuthority {
    allowed: HashSet<String>,
    calls: AtomicUsize,
}

impl StaticAuthority {
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteAuthority for StaticAuthority {
    async fn query(&self, _parameter: &str, value: &str) -> PermitResult<AccessResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(AccessResponse {
            allowed: Some(self.allowed.contains(value)),
        })
    }
}

pub(crate) fn checker_allowing(values: &[&str]) -> (PermissionChecker, Arc<StaticAuthority>) {
    let authority = Arc::new(StaticAuthority {
        allowed: values.iter().map(|v| v.to_string()).collect(),
        calls: AtomicUsize::new(0),
    });
    (PermissionChecker::new(authority.clone()), authority)
}

#[derive(Debug)]
pub(crate) struct FakeElement {
    pub(crate) display: String,
}

impl FakeElement {
    pub(crate) fn new(display: &str) -> Self {
        Self {
            display: display.to_string(),
        }
    }
}

impl Displayable for FakeElement {
    fn display(&self) -> String {
        self.display.clone()
    }

    fn set_display(&mut self, display: &str) {
        self.display = display.to_string();
    }
}
