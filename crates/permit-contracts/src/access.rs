//! The remote authority's answer to a permission lookup.

/// Parsed body of a permission lookup response.
///
/// The wire shape is `{ "allowed": bool }`. Anything else is not an error:
/// a missing or non-boolean `allowed` is read as "not allowed".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessResponse {
    pub allowed: Option<bool>,
}

impl AccessResponse {
    /// Read the response leniently from an arbitrary JSON document.
    pub fn from_json(value: &serde_json::Value) -> Self {
        Self {
            allowed: value.get("allowed").and_then(serde_json::Value::as_bool),
        }
    }

    /// The outcome of the lookup. Absent means denied.
    pub fn is_allowed(&self) -> bool {
        self.allowed.unwrap_or(false)
    }
}
