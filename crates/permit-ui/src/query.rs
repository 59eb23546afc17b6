//! A reactive permission query for a single component.
//!
//! `PermissionQuery` keeps the last known answer for one action and publishes
//! every state change on a `tokio::sync::watch` channel, so a UI layer can
//! re-render from `subscribe()` without polling.

use tokio::sync::watch;
use tracing::debug;

use permit_contracts::action::ActionIdentifier;
use permit_core::PermissionChecker;

/// Three-state view of a query, plus "never asked".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No check has completed and none is running.
    Unknown,
    /// A check is in flight.
    Pending,
    Allowed,
    Denied,
}

/// Snapshot published to subscribers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryState {
    /// `None` until the first check completes.
    pub is_allowed: Option<bool>,
    pub is_loading: bool,
}

impl QueryState {
    /// True only once a check has confirmed the action is allowed.
    pub fn can(&self) -> bool {
        self.is_allowed == Some(true)
    }

    pub fn access(&self) -> Access {
        match (self.is_loading, self.is_allowed) {
            (true, _) => Access::Pending,
            (false, None) => Access::Unknown,
            (false, Some(true)) => Access::Allowed,
            (false, Some(false)) => Access::Denied,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Run a check as soon as the query is started.
    pub auto_check: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self { auto_check: true }
    }
}

/// Tracks whether one action is allowed.
#[derive(Debug)]
pub struct PermissionQuery {
    checker: PermissionChecker,
    action: ActionIdentifier,
    state: watch::Sender<QueryState>,
}

impl PermissionQuery {
    /// Create a query without checking anything yet.
    pub fn new(checker: PermissionChecker, action: impl Into<ActionIdentifier>) -> Self {
        let (state, _) = watch::channel(QueryState::default());
        Self {
            checker,
            action: action.into(),
            state,
        }
    }

    /// Create a query and, unless `options.auto_check` is off, run the first
    /// check before returning.
    pub async fn start(
        checker: PermissionChecker,
        action: impl Into<ActionIdentifier>,
        options: QueryOptions,
    ) -> Self {
        let query = Self::new(checker, action);
        if options.auto_check {
            query.check().await;
        }
        query
    }

    /// Ask the checker about the current action and publish the answer.
    ///
    /// An empty action is skipped and leaves the state untouched.
    pub async fn check(&self) {
        if self.action.is_empty() {
            debug!("skipping permission check for empty action");
            return;
        }

        self.state.send_modify(|state| state.is_loading = true);
        let allowed = self.checker.can(&self.action).await;
        self.state.send_modify(|state| {
            state.is_allowed = Some(allowed);
            state.is_loading = false;
        });
    }

    /// Point the query at a different action and re-check.
    ///
    /// Setting the same action again does nothing.
    pub async fn set_action(&mut self, action: impl Into<ActionIdentifier>) {
        let action = action.into();
        if action == self.action {
            return;
        }
        debug!(from = %self.action, to = %action, "permission query action changed");
        self.action = action;
        self.check().await;
    }

    pub fn action(&self) -> &ActionIdentifier {
        &self.action
    }

    pub fn state(&self) -> QueryState {
        *self.state.borrow()
    }

    pub fn is_allowed(&self) -> Option<bool> {
        self.state().is_allowed
    }

    pub fn is_loading(&self) -> bool {
        self.state().is_loading
    }

    pub fn can(&self) -> bool {
        self.state().can()
    }

    pub fn access(&self) -> Access {
        self.state().access()
    }

    /// Receive every future state change.
    pub fn subscribe(&self) -> watch::Receiver<QueryState> {
        self.state.subscribe()
    }
}
