//! Visibility bindings: show or hide an element by permission.
//!
//! A binding follows the element lifecycle of a UI framework:
//!
//! - `mount`  : remember the element's display value, hide it, check, and
//!   reveal it when the outcome matches the binding's `ShowWhen`
//! - `update` : re-run the above only if the bound action changed
//! - `unmount`: put the remembered display value back
//!
//! An element stays hidden while its check is in flight, so a denied control
//! never flashes on screen.

use tracing::debug;

use permit_contracts::action::ActionIdentifier;
use permit_core::PermissionChecker;

/// Display value used to hide an element.
pub const HIDDEN: &str = "none";

/// Anything with a CSS-like display property.
pub trait Displayable {
    fn display(&self) -> String;
    fn set_display(&mut self, display: &str);
}

/// Which outcome reveals the element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowWhen {
    /// `v-can`: visible only when allowed.
    Allowed,
    /// `v-cant`: visible only when denied.
    Denied,
}

impl ShowWhen {
    fn reveals(self, allowed: bool) -> bool {
        match self {
            Self::Allowed => allowed,
            Self::Denied => !allowed,
        }
    }
}

#[derive(Debug, Clone)]
struct BindingData {
    action: ActionIdentifier,
    original_display: String,
    checked: bool,
}

/// One element bound to one action.
#[derive(Debug)]
pub struct VisibilityBinding<E: Displayable> {
    checker: PermissionChecker,
    show_when: ShowWhen,
    element: E,
    data: Option<BindingData>,
}

impl<E: Displayable> VisibilityBinding<E> {
    pub fn new(checker: PermissionChecker, show_when: ShowWhen, element: E) -> Self {
        Self {
            checker,
            show_when,
            element,
            data: None,
        }
    }

    /// A binding that shows `element` only when its action is allowed.
    pub fn can(checker: PermissionChecker, element: E) -> Self {
        Self::new(checker, ShowWhen::Allowed, element)
    }

    /// A binding that shows `element` only when its action is denied.
    pub fn cant(checker: PermissionChecker, element: E) -> Self {
        Self::new(checker, ShowWhen::Denied, element)
    }

    pub async fn mount(&mut self, action: impl Into<ActionIdentifier>) {
        self.process(action.into()).await;
    }

    /// Re-check only when `action` differs from the bound one.
    pub async fn update(&mut self, action: impl Into<ActionIdentifier>) {
        let action = action.into();
        let unchanged = self
            .data
            .as_ref()
            .is_some_and(|data| data.action == action);
        if !unchanged {
            self.process(action).await;
        }
    }

    /// Restore the element's display value and drop the binding state.
    pub fn unmount(&mut self) {
        if let Some(data) = self.data.take() {
            self.element.set_display(&data.original_display);
        }
    }

    /// Return true once the bound action's check has completed.
    pub fn is_checked(&self) -> bool {
        self.data.as_ref().is_some_and(|data| data.checked)
    }

    pub fn element(&self) -> &E {
        &self.element
    }

    pub fn into_element(self) -> E {
        self.element
    }

    async fn process(&mut self, action: ActionIdentifier) {
        // A re-bound element may currently be hidden by this binding; keep the
        // display value captured when it was first bound.
        let original_display = match &self.data {
            Some(data) => data.original_display.clone(),
            None => self.element.display(),
        };

        self.data = Some(BindingData {
            action: action.clone(),
            original_display: original_display.clone(),
            checked: false,
        });
        self.element.set_display(HIDDEN);

        let allowed = self.checker.can(&action).await;
        if self.show_when.reveals(allowed) {
            self.element.set_display(&original_display);
        }
        debug!(action = %action, allowed, show_when = ?self.show_when, "visibility binding resolved");

        if let Some(data) = self.data.as_mut() {
            data.checked = true;
        }
    }
}
