use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque caller-supplied key identifying one stored vector.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorId(String);

impl VectorId {
    /// Wraps an existing key.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh identifier from a UUID v4.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the identifier and returns the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for VectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VectorId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for VectorId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<VectorId> for String {
    fn from(value: VectorId) -> Self {
        value.0
    }
}

impl Borrow<str> for VectorId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for VectorId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_random_ids_are_unique() {
        assert_ne!(VectorId::random(), VectorId::random());
    }

    #[test]
    fn test_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(VectorId::from("doc-1"), 7);
        assert_eq!(map.get("doc-1"), Some(&7));
    }

    #[test]
    fn test_serde_transparent() {
        let id = VectorId::new("doc-42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"doc-42\"");
    }
}
