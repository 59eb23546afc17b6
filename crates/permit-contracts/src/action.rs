//! Action identifiers and the cache keys derived from them.
//!
//! PERMIT never interprets an action: it is an opaque token relayed to the
//! remote authority. A caller asks about either one token or an ordered set
//! of tokens, and a set means "is at least one of these allowed", answered
//! by a single combined remote lookup.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What a caller is asking permission for.
///
/// Action names should be namespaced and descriptive:
/// e.g. "report:edit", "dashboard:view", "user:invite".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionIdentifier {
    /// One opaque action token.
    Single(String),

    /// An ordered set of tokens, granted when at least one is allowed.
    ///
    /// Order is significant: `["a", "b"]` and `["b", "a"]` are distinct
    /// lookups with distinct cache entries.
    Set(Vec<String>),
}

impl ActionIdentifier {
    /// Construct a single-token identifier.
    pub fn single(name: impl Into<String>) -> Self {
        Self::Single(name.into())
    }

    /// Construct a set identifier from any sequence of string-like tokens.
    pub fn set<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Set(names.into_iter().map(Into::into).collect())
    }

    /// Return true if there is nothing to ask the remote authority about.
    ///
    /// Empty identifiers are denied locally and never sent.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(name) => name.is_empty(),
            Self::Set(names) => names.is_empty(),
        }
    }

    /// The value sent under the `action` query parameter.
    ///
    /// A single token goes as-is; a set is encoded as a compact JSON array of
    /// strings, e.g. `["a","b"]`.
    pub fn query_value(&self) -> String {
        match self {
            Self::Single(name) => name.clone(),
            Self::Set(names) => serde_json::Value::from(names.clone()).to_string(),
        }
    }

    /// The canonical cache key for this identifier.
    pub fn cache_key(&self) -> CacheKey {
        CacheKey(self.query_value())
    }
}

impl fmt::Display for ActionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.query_value())
    }
}

impl From<&str> for ActionIdentifier {
    fn from(name: &str) -> Self {
        Self::Single(name.to_string())
    }
}

impl From<String> for ActionIdentifier {
    fn from(name: String) -> Self {
        Self::Single(name)
    }
}

impl From<&String> for ActionIdentifier {
    fn from(name: &String) -> Self {
        Self::Single(name.clone())
    }
}

impl From<Vec<String>> for ActionIdentifier {
    fn from(names: Vec<String>) -> Self {
        Self::Set(names)
    }
}

impl From<Vec<&str>> for ActionIdentifier {
    fn from(names: Vec<&str>) -> Self {
        Self::set(names)
    }
}

impl From<&[&str]> for ActionIdentifier {
    fn from(names: &[&str]) -> Self {
        Self::set(names.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for ActionIdentifier {
    fn from(names: [&str; N]) -> Self {
        Self::set(names)
    }
}

impl From<&ActionIdentifier> for ActionIdentifier {
    fn from(action: &ActionIdentifier) -> Self {
        action.clone()
    }
}

/// Canonical string form of an `ActionIdentifier`.
///
/// Equal identifiers always produce equal keys. For a single token the key
/// is the token itself; for a set it is the JSON array encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(pub String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
