//! # permit-ui
//!
//! Framework-neutral adapters that put a [`PermissionChecker`](permit_core::PermissionChecker)
//! behind the shapes UI code expects:
//!
//! - [`PermissionsRegistry`]: install the service once, resolve it anywhere
//! - [`PermissionQuery`]: reactive `{ is_allowed, is_loading }` state for one action
//! - [`VisibilityBinding`]: show or hide an element by permission (`v-can` / `v-cant`)
//! - [`Check`]: pick between an allowed slot and a fallback
//!
//! None of these add caching of their own; every check goes through the
//! shared checker, so all components asking about one action share one lookup.

pub mod check;
pub mod directive;
pub mod plugin;
pub mod query;

#[cfg(test)]
pub(crate) mod testing;

pub use check::Check;
pub use directive::{Displayable, ShowWhen, VisibilityBinding};
pub use plugin::PermissionsRegistry;
pub use query::{Access, PermissionQuery, QueryOptions, QueryState};
