//! The permission checker: a caching, request-deduplicating lookup service.
//!
//! Every key moves through the same lifecycle:
//!
//!   unresolved → pending → resolved
//!
//! A resolved key goes back to unresolved only through `clear_cache`. A
//! pending key whose lookup fails goes back to unresolved, so the next
//! query retries instead of inheriting the failure. The same holds when
//! every caller waiting on a lookup gives up before it settles. Confirmed
//! denials are cached like grants; failures are never cached.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, error, warn};

use permit_contracts::action::{ActionIdentifier, CacheKey};

use crate::traits::RemoteAuthority;

/// Query parameter that carries the action value on every lookup.
pub const ACTION_PARAMETER: &str = "action";

/// An in-flight lookup joined by every caller asking about the same key.
///
/// Resolves to `Some(allowed)` when the authority answered and `None` when
/// the lookup failed.
type PendingLookup = Shared<BoxFuture<'static, Option<bool>>>;

#[derive(Default)]
struct CacheState {
    resolved: HashMap<CacheKey, bool>,
    pending: HashMap<CacheKey, PendingLookup>,
}

struct Inner {
    authority: Arc<dyn RemoteAuthority>,
    state: Mutex<CacheState>,
}

impl Inner {
    // No critical section can panic half-way through a write, so a poisoned
    // lock still guards consistent maps.
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Answers "is this action (or at least one of these actions) allowed?" with
/// at most one remote request per distinct cache key at a time.
///
/// Cloning a checker yields another handle to the same cache. Separately
/// constructed checkers share nothing.
#[derive(Clone)]
pub struct PermissionChecker {
    inner: Arc<Inner>,
}

impl PermissionChecker {
    /// Create a checker with an empty cache in front of `authority`.
    pub fn new(authority: Arc<dyn RemoteAuthority>) -> Self {
        Self {
            inner: Arc::new(Inner {
                authority,
                state: Mutex::new(CacheState::default()),
            }),
        }
    }

    /// Return whether `action` is allowed.
    ///
    /// Resolved keys return without suspending. A key with a lookup already
    /// in flight joins that lookup. Otherwise exactly one remote query is
    /// issued and its answer cached.
    ///
    /// Never fails: an empty action, a transport error, a non-success status
    /// or an unreadable body all answer `false`.
    pub async fn can(&self, action: impl Into<ActionIdentifier>) -> bool {
        let action = action.into();

        if action.is_empty() {
            warn!("empty action identifier; denying without a remote lookup");
            return false;
        }

        let key = action.cache_key();

        let lookup = {
            let mut state = self.inner.lock();

            if let Some(&allowed) = state.resolved.get(&key) {
                debug!(action = %key, allowed, "permission cache hit");
                return allowed;
            }

            let in_flight = state.pending.get(&key).cloned();
            match in_flight {
                Some(pending) => {
                    debug!(action = %key, "joining in-flight permission lookup");
                    pending
                }
                None => {
                    let lookup = self.start_lookup(key.clone(), action.query_value());
                    state.pending.insert(key.clone(), lookup.clone());
                    lookup
                }
            }
        };

        let mut waiter = Waiter {
            inner: &self.inner,
            key,
            lookup,
            settled: false,
        };
        let outcome = (&mut waiter.lookup).await;
        waiter.settled = true;

        outcome.unwrap_or(false)
    }

    /// Forget cached results.
    ///
    /// `Some(action)` drops only that action's entry; `None` drops every
    /// entry. Lookups already in flight are left alone and repopulate the
    /// cache when they complete. Clearing an absent key is a no-op.
    pub fn clear_cache(&self, action: Option<&ActionIdentifier>) {
        let mut state = self.inner.lock();
        match action {
            Some(action) => {
                let key = action.cache_key();
                if state.resolved.remove(&key).is_some() {
                    debug!(action = %key, "cleared cached permission");
                }
            }
            None => {
                debug!(entries = state.resolved.len(), "cleared permission cache");
                state.resolved.clear();
            }
        }
    }

    /// The cached answer for `action`, if one is resolved.
    pub fn cached(&self, action: &ActionIdentifier) -> Option<bool> {
        self.inner.lock().resolved.get(&action.cache_key()).copied()
    }

    /// Return true while a lookup for `action` is in flight.
    pub fn is_pending(&self, action: &ActionIdentifier) -> bool {
        self.inner.lock().pending.contains_key(&action.cache_key())
    }

    /// Number of resolved entries.
    pub fn cached_len(&self) -> usize {
        self.inner.lock().resolved.len()
    }

    /// Build the shared lookup for `key`.
    ///
    /// The lookup records its own outcome, so whichever caller drives it to
    /// completion settles the key for all of them. It holds the checker
    /// weakly: a pending entry must not keep its own owner alive.
    fn start_lookup(&self, key: CacheKey, value: String) -> PendingLookup {
        let authority = Arc::clone(&self.inner.authority);
        let owner: Weak<Inner> = Arc::downgrade(&self.inner);

        async move {
            debug!(action = %key, "querying remote authority");
            let result = authority.query(ACTION_PARAMETER, &value).await;

            let outcome = match result {
                Ok(response) => Some(response.is_allowed()),
                Err(e) => {
                    error!(
                        action = %key,
                        error = %e,
                        transient = e.is_transient(),
                        "permission lookup failed; denying"
                    );
                    None
                }
            };

            if let Some(inner) = owner.upgrade() {
                let mut state = inner.lock();
                state.pending.remove(&key);
                if let Some(allowed) = outcome {
                    debug!(action = %key, allowed, "permission resolved");
                    state.resolved.insert(key, allowed);
                }
            }

            outcome
        }
        .boxed()
        .shared()
    }
}

/// One caller's interest in a pending lookup.
///
/// Dropped before the lookup settles (the caller's future was cancelled or
/// timed out), the last waiter releases the pending slot so the next query
/// for the key starts a fresh lookup instead of resuming an abandoned one.
struct Waiter<'a> {
    inner: &'a Inner,
    key: CacheKey,
    lookup: PendingLookup,
    settled: bool,
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        let mut state = self.inner.lock();
        // Two handles left means the map's and this one: nobody else awaits it.
        let abandoned = self.lookup.strong_count() == Some(2)
            && state
                .pending
                .get(&self.key)
                .is_some_and(|pending| pending.ptr_eq(&self.lookup));
        if abandoned {
            debug!(action = %self.key, "last waiter gone; releasing pending lookup");
            state.pending.remove(&self.key);
        }
    }
}

impl std::fmt::Debug for PermissionChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("PermissionChecker")
            .field("resolved", &state.resolved.len())
            .field("pending", &state.pending.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::{Notify, Semaphore};

    use permit_contracts::{
        access::AccessResponse,
        action::ActionIdentifier,
        error::{PermitError, PermitResult},
    };

    use crate::traits::RemoteAuthority;

    use super::{PermissionChecker, ACTION_PARAMETER};

    // ── Mock authority ───────────────────────────────────────────────────────

    /// A remote authority that records every query and answers from a table.
    ///
    /// Values missing from the table get a body without an `allowed` flag.
    struct MockAuthority {
        calls: AtomicUsize,
        requests: Mutex<Vec<(String, String)>>,
        answers: Mutex<HashMap<String, bool>>,
        fail: AtomicBool,
        started: Notify,
        gate: Option<Semaphore>,
    }

    impl MockAuthority {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                requests: Mutex::new(vec![]),
                answers: Mutex::new(HashMap::new()),
                fail: AtomicBool::new(false),
                started: Notify::new(),
                gate: None,
            }
        }

        /// Queries block until `release()` is called.
        fn gated() -> Self {
            Self {
                gate: Some(Semaphore::new(0)),
                ..Self::new()
            }
        }

        fn answer(self, value: &str, allowed: bool) -> Self {
            self.answers.lock().unwrap().insert(value.to_string(), allowed);
            self
        }

        fn set_failing(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }

        fn release(&self) {
            if let Some(gate) = &self.gate {
                gate.add_permits(1);
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RemoteAuthority for MockAuthority {
        async fn query(&self, parameter: &str, value: &str) -> PermitResult<AccessResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests
                .lock()
                .unwrap()
                .push((parameter.to_string(), value.to_string()));
            self.started.notify_one();

            match &self.gate {
                Some(gate) => gate.acquire().await.unwrap().forget(),
                // Suspend once so concurrent callers can observe the pending lookup.
                None => tokio::task::yield_now().await,
            }

            if self.fail.load(Ordering::SeqCst) {
                return Err(PermitError::Transport {
                    reason: "connection refused".to_string(),
                });
            }

            Ok(AccessResponse {
                allowed: self.answers.lock().unwrap().get(value).copied(),
            })
        }
    }

    fn checker_with(mock: &Arc<MockAuthority>) -> PermissionChecker {
        PermissionChecker::new(mock.clone())
    }

    // ── Caching ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_resolved_single_action_is_not_queried_again() {
        let mock = Arc::new(MockAuthority::new().answer("edit", true));
        let checker = checker_with(&mock);

        assert!(checker.can("edit").await);
        assert!(checker.can("edit").await);
        assert!(checker.can(String::from("edit")).await);

        assert_eq!(mock.calls(), 1);
        assert_eq!(checker.cached(&"edit".into()), Some(true));
    }

    #[tokio::test]
    async fn test_confirmed_denial_is_cached() {
        let mock = Arc::new(MockAuthority::new().answer("delete", false));
        let checker = checker_with(&mock);

        assert!(!checker.can("delete").await);
        assert!(!checker.can("delete").await);

        assert_eq!(mock.calls(), 1);
        assert_eq!(checker.cached(&"delete".into()), Some(false));
    }

    #[tokio::test]
    async fn test_missing_allowed_flag_is_cached_denial() {
        let mock = Arc::new(MockAuthority::new());
        let checker = checker_with(&mock);

        assert!(!checker.can("unknown").await);
        assert!(!checker.can("unknown").await);

        assert_eq!(mock.calls(), 1);
        assert_eq!(checker.cached(&"unknown".into()), Some(false));
    }

    // ── Remote query construction ────────────────────────────────────────────

    #[tokio::test]
    async fn test_query_parameters_for_single_and_set() {
        let mock = Arc::new(MockAuthority::new().answer(r#"["view","edit"]"#, true));
        let checker = checker_with(&mock);

        checker.can("view").await;
        assert!(checker.can(["view", "edit"]).await);

        let requests = mock.requests.lock().unwrap().clone();
        assert_eq!(
            requests,
            vec![
                (ACTION_PARAMETER.to_string(), "view".to_string()),
                (ACTION_PARAMETER.to_string(), r#"["view","edit"]"#.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_set_order_yields_distinct_lookups() {
        let mock = Arc::new(MockAuthority::new());
        let checker = checker_with(&mock);

        checker.can(["a", "b"]).await;
        checker.can(["b", "a"]).await;
        checker.can(["a", "b"]).await;

        assert_eq!(mock.calls(), 2);
        assert_eq!(checker.cached_len(), 2);
    }

    #[tokio::test]
    async fn test_empty_set_denied_without_remote_call() {
        let mock = Arc::new(MockAuthority::new());
        let checker = checker_with(&mock);

        assert!(!checker.can(Vec::<String>::new()).await);
        assert!(!checker.can("").await);

        assert_eq!(mock.calls(), 0);
        assert_eq!(checker.cached_len(), 0);
    }

    // ── clear_cache ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_clear_single_key_forces_new_lookup() {
        let mock = Arc::new(MockAuthority::new().answer("edit", true).answer("view", true));
        let checker = checker_with(&mock);

        assert!(checker.can("edit").await);
        assert!(checker.can("view").await);
        assert_eq!(mock.calls(), 2);

        checker.clear_cache(Some(&"edit".into()));
        assert_eq!(checker.cached(&"edit".into()), None);
        assert_eq!(checker.cached(&"view".into()), Some(true));

        assert!(checker.can("edit").await);
        assert!(checker.can("view").await);
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test]
    async fn test_clear_set_key() {
        let mock = Arc::new(MockAuthority::new());
        let checker = checker_with(&mock);

        let set = ActionIdentifier::set(["a", "b"]);
        checker.can(&set).await;
        checker.clear_cache(Some(&set));
        checker.can(&set).await;

        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_clear_all_and_absent_key() {
        let mock = Arc::new(MockAuthority::new());
        let checker = checker_with(&mock);

        checker.can("a").await;
        checker.can("b").await;
        assert_eq!(checker.cached_len(), 2);

        // Clearing a key that was never looked up is a no-op.
        checker.clear_cache(Some(&"never-seen".into()));
        assert_eq!(checker.cached_len(), 2);

        checker.clear_cache(None);
        assert_eq!(checker.cached_len(), 0);

        checker.can("a").await;
        assert_eq!(mock.calls(), 3);
    }

    // ── Failure and retry ────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_failure_denies_then_retry_succeeds() {
        let mock = Arc::new(MockAuthority::new().answer("edit", true));
        let checker = checker_with(&mock);

        mock.set_failing(true);
        assert!(!checker.can("edit").await);
        assert_eq!(checker.cached(&"edit".into()), None);
        assert!(!checker.is_pending(&"edit".into()));

        mock.set_failing(false);
        assert!(checker.can("edit").await);
        assert_eq!(mock.calls(), 2);
        assert_eq!(checker.cached(&"edit".into()), Some(true));
    }

    // ── Concurrency ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_concurrent_callers_share_one_lookup() {
        let mock = Arc::new(MockAuthority::new().answer("edit", true));
        let checker = checker_with(&mock);

        let (first, second) = tokio::join!(checker.can("edit"), checker.can("edit"));

        assert!(first);
        assert!(second);
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_failure() {
        let mock = Arc::new(MockAuthority::new().answer("edit", true));
        mock.set_failing(true);
        let checker = checker_with(&mock);

        let (first, second) = tokio::join!(checker.can("edit"), checker.can("edit"));

        assert!(!first);
        assert!(!second);
        assert_eq!(mock.calls(), 1);
        assert!(!checker.is_pending(&"edit".into()));
    }

    #[tokio::test]
    async fn test_different_keys_do_not_share_lookups() {
        let mock = Arc::new(MockAuthority::new().answer("a", true));
        let checker = checker_with(&mock);

        let (a, b) = tokio::join!(checker.can("a"), checker.can("b"));

        assert!(a);
        assert!(!b);
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_clear_does_not_cancel_pending_lookup() {
        let mock = Arc::new(MockAuthority::gated().answer("edit", true));
        let checker = checker_with(&mock);

        let background = checker.clone();
        let task = tokio::spawn(async move { background.can("edit").await });

        mock.started.notified().await;
        assert!(checker.is_pending(&"edit".into()));

        checker.clear_cache(None);
        checker.clear_cache(Some(&"edit".into()));
        assert!(checker.is_pending(&"edit".into()));

        mock.release();
        assert!(task.await.unwrap());

        assert!(!checker.is_pending(&"edit".into()));
        assert_eq!(checker.cached(&"edit".into()), Some(true));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_late_joiner_receives_pending_result() {
        let mock = Arc::new(MockAuthority::gated().answer("edit", true));
        let checker = checker_with(&mock);

        let first = checker.clone();
        let first = tokio::spawn(async move { first.can("edit").await });
        mock.started.notified().await;

        let second = checker.clone();
        let second = tokio::spawn(async move { second.can("edit").await });
        tokio::task::yield_now().await;

        mock.release();
        assert!(first.await.unwrap());
        assert!(second.await.unwrap());
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_abandoned_lookup_releases_slot_for_retry() {
        let mock = Arc::new(MockAuthority::gated().answer("edit", true));
        let checker = checker_with(&mock);

        let timed_out = tokio::time::timeout(Duration::from_millis(20), checker.can("edit")).await;
        assert!(timed_out.is_err());
        assert!(!checker.is_pending(&"edit".into()));
        assert_eq!(checker.cached(&"edit".into()), None);

        mock.release();
        assert!(checker.can("edit").await);
        assert_eq!(mock.calls(), 2);
        assert_eq!(checker.cached(&"edit".into()), Some(true));
    }

    #[tokio::test]
    async fn test_one_cancelled_waiter_keeps_lookup_for_others() {
        let mock = Arc::new(MockAuthority::gated().answer("edit", true));
        let checker = checker_with(&mock);

        let background = checker.clone();
        let task = tokio::spawn(async move { background.can("edit").await });
        mock.started.notified().await;

        let timed_out = tokio::time::timeout(Duration::from_millis(20), checker.can("edit")).await;
        assert!(timed_out.is_err());
        assert!(checker.is_pending(&"edit".into()));

        mock.release();
        assert!(task.await.unwrap());
        assert_eq!(mock.calls(), 1);
    }

    // ── Isolation ────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_separate_checkers_do_not_share_cache() {
        let mock = Arc::new(MockAuthority::new().answer("edit", true));
        let one = checker_with(&mock);
        let two = checker_with(&mock);

        one.can("edit").await;
        two.can("edit").await;

        assert_eq!(mock.calls(), 2);

        // Clones are handles onto the same cache.
        let clone = one.clone();
        clone.can("edit").await;
        assert_eq!(mock.calls(), 2);
    }
}
