//! Typed permission set
//!
//! Permission checks run against [`PermissionKey`] values, never raw strings,
//! so a misspelled key is a compile error instead of a silent deny.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use shared::models::PermissionKey;

/// Combination policy for multi-key requirements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// At least one key must be present
    #[default]
    Any,
    /// Every key must be present
    All,
}

/// Set of granted permission keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<PermissionKey>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every key in the catalog
    pub fn full() -> Self {
        PermissionKey::ALL.iter().copied().collect()
    }

    /// Parse raw backend strings, dropping unknown keys
    ///
    /// Returns the set and the strings that were rejected.
    pub fn from_names<I, S>(names: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        let mut unknown = Vec::new();
        for name in names {
            match name.as_ref().parse::<PermissionKey>() {
                Ok(key) => {
                    set.insert(key);
                }
                Err(_) => unknown.push(name.as_ref().to_string()),
            }
        }
        (set, unknown)
    }

    pub fn insert(&mut self, key: PermissionKey) -> bool {
        self.0.insert(key)
    }

    pub fn extend(&mut self, other: &PermissionSet) {
        self.0.extend(other.0.iter().copied());
    }

    pub fn contains(&self, key: PermissionKey) -> bool {
        self.0.contains(&key)
    }

    pub fn contains_any(&self, keys: &[PermissionKey]) -> bool {
        keys.iter().any(|k| self.contains(*k))
    }

    pub fn contains_all(&self, keys: &[PermissionKey]) -> bool {
        keys.iter().all(|k| self.contains(*k))
    }

    /// Check `keys` under `policy`; an empty key list is always satisfied
    pub fn satisfies(&self, keys: &[PermissionKey], policy: MatchPolicy) -> bool {
        match policy {
            MatchPolicy::Any => keys.is_empty() || self.contains_any(keys),
            MatchPolicy::All => self.contains_all(keys),
        }
    }

    /// Keys from `keys` that are not granted
    pub fn missing(&self, keys: &[PermissionKey]) -> Vec<PermissionKey> {
        keys.iter().copied().filter(|k| !self.contains(*k)).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = PermissionKey> + '_ {
        self.0.iter().copied()
    }

    /// Backend strings, in catalog order
    pub fn names(&self) -> Vec<&'static str> {
        self.0.iter().map(|k| k.as_str()).collect()
    }
}

impl FromIterator<PermissionKey> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = PermissionKey>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[PermissionKey; N]> for PermissionSet {
    fn from(keys: [PermissionKey; N]) -> Self {
        keys.into_iter().collect()
    }
}
