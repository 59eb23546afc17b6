//! Installation of the permissions service into a host application.
//!
//! The host owns a `PermissionsRegistry`, installs one checker into it at
//! startup, and hands the registry (or the checker it yields) to whichever
//! components need permission checks. There is no process-wide instance.

use tracing::debug;

use permit_contracts::{
    action::ActionIdentifier,
    error::{PermitError, PermitResult},
};
use permit_core::PermissionChecker;

use crate::check::Check;
use crate::directive::{Displayable, VisibilityBinding};
use crate::query::{PermissionQuery, QueryOptions};

/// Holds the installed permissions service for one host application.
#[derive(Debug, Clone, Default)]
pub struct PermissionsRegistry {
    checker: Option<PermissionChecker>,
}

impl PermissionsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `checker` as the service every component resolves.
    ///
    /// Installing again replaces the previous checker and its cache.
    pub fn install(&mut self, checker: PermissionChecker) {
        if self.checker.is_some() {
            debug!("replacing installed permissions service");
        }
        self.checker = Some(checker);
    }

    pub fn is_installed(&self) -> bool {
        self.checker.is_some()
    }

    /// Resolve the installed service.
    ///
    /// Returns `PermitError::NotInstalled` when nothing was installed. This is
    /// a wiring mistake in the host and should fail loudly, not deny.
    pub fn service(&self) -> PermitResult<PermissionChecker> {
        self.checker.clone().ok_or(PermitError::NotInstalled)
    }

    /// Create a reactive query for `action` against the installed service.
    pub async fn query(
        &self,
        action: impl Into<ActionIdentifier>,
        options: QueryOptions,
    ) -> PermitResult<PermissionQuery> {
        let checker = self.service()?;
        Ok(PermissionQuery::start(checker, action, options).await)
    }

    /// Bind `element` so it is shown only when its action is allowed.
    pub fn bind_can<E: Displayable>(&self, element: E) -> PermitResult<VisibilityBinding<E>> {
        Ok(VisibilityBinding::can(self.service()?, element))
    }

    /// Bind `element` so it is shown only when its action is denied.
    pub fn bind_cant<E: Displayable>(&self, element: E) -> PermitResult<VisibilityBinding<E>> {
        Ok(VisibilityBinding::cant(self.service()?, element))
    }

    /// Create a `Check` display component for `action`.
    pub fn check(&self, action: impl Into<ActionIdentifier>) -> PermitResult<Check> {
        Ok(Check::new(self.service()?, action))
    }
}
