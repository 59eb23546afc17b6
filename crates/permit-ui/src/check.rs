//! `Check`: a display component that renders one of two slots.

use permit_contracts::action::ActionIdentifier;
use permit_core::PermissionChecker;

#[derive(Debug, Clone)]
pub struct Check {
    checker: PermissionChecker,
    action: ActionIdentifier,
}

impl Check {
    pub fn new(checker: PermissionChecker, action: impl Into<ActionIdentifier>) -> Self {
        Self {
            checker,
            action: action.into(),
        }
    }

    pub fn action(&self) -> &ActionIdentifier {
        &self.action
    }

    pub async fn is_allowed(&self) -> bool {
        self.checker.can(&self.action).await
    }

    /// Return `allowed` when the action is allowed, `fallback` otherwise.
    pub async fn render<T>(&self, allowed: T, fallback: T) -> T {
        if self.is_allowed().await {
            allowed
        } else {
            fallback
        }
    }
}
