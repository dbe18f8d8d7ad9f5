use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ConfigError;

/// Opaque reference to a node in the host UI tree.
///
/// The host chooses the numbering; the watchdog only passes it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef(u64);

impl NodeRef {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Element identifier used to find a region or control.
///
/// Accepts `#elem_id` or a bare `elem_id`. The stored form is kept as
/// written so config round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Selector(String);

impl Selector {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidSelector {
            selector: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.is_empty() {
            return Err(invalid("selector is empty"));
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(invalid("selector contains whitespace"));
        }

        let id = raw.strip_prefix('#').unwrap_or(raw);
        if id.is_empty() {
            return Err(invalid("selector has no element id"));
        }
        if id.contains('#') {
            return Err(invalid("only one leading '#' is allowed"));
        }

        Ok(Self(raw.to_string()))
    }

    /// Built-in selectors that are known valid.
    pub(crate) fn from_static(raw: &'static str) -> Self {
        Self(raw.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The element id without the leading `#`.
    pub fn element_id(&self) -> &str {
        self.0.strip_prefix('#').unwrap_or(&self.0)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Selector {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Selector::parse(&value)
    }
}

impl From<Selector> for String {
    fn from(selector: Selector) -> Self {
        selector.0
    }
}
