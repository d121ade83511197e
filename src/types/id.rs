// ABOUTME: Phantom-typed identifiers for compile-time type safety.
// ABOUTME: Prevents accidental swapping of execution ids and job names.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Marker types for phantom type parameters.
/// Using empty enums prevents instantiation and requires no trait bounds.
pub enum ExecutionMarker {}
pub enum JobMarker {}

/// A type-safe identifier that prevents accidental mixing of different ID types.
///
/// An `ExecutionId` names an orchestrator execution awaiting a callback and a
/// `JobName` names a deployment job in the engine's history. Both are strings
/// on the wire but never interchangeable in code.
#[must_use = "IDs reference external records and should not be ignored"]
pub struct Id<T> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_inner(self) -> String {
        self.value
    }
}

// Manual trait implementations that don't require T to implement the trait.

impl<T> std::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Id").field("value", &self.value).finish()
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> std::fmt::Display for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::new(value))
    }
}

pub type ExecutionId = Id<ExecutionMarker>;
pub type JobName = Id<JobMarker>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_compare_by_value() {
        assert_eq!(ExecutionId::new("exec-1"), ExecutionId::new("exec-1"));
        assert_ne!(JobName::new("JOB_1"), JobName::new("JOB_2"));
    }

    #[test]
    fn ids_hash_by_value() {
        let mut set = HashSet::new();
        set.insert(ExecutionId::new("a"));
        set.insert(ExecutionId::new("a"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn id_serializes_as_plain_string() {
        let json = serde_json::to_string(&JobName::new("DEPLOY_42")).unwrap();
        assert_eq!(json, "\"DEPLOY_42\"");
        let back: JobName = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_str(), "DEPLOY_42");
    }
}
