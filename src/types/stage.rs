// ABOUTME: Deployment lifecycle stage identifier.
// ABOUTME: Stage names are normalized to upper case the way the engine stores them.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A named point in a deployment lifecycle (e.g. DEV, TEST, PROD).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StageId(String);

impl StageId {
    /// Create a stage id, normalizing to upper case.
    pub fn new(value: &str) -> Self {
        Self(value.trim().to_uppercase())
    }

    /// Parse an optional stage argument; blank input means "no stage".
    pub fn parse_optional(value: Option<&str>) -> Option<Self> {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(StageId::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for StageId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(StageId::new(&s))
    }
}
