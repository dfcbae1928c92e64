//! Language codes and the process-wide language lookup.
//!
//! The registry stores one availability record per (version, language)
//! pair. Language codes are resolved through an explicitly constructed
//! [`LanguageCache`] rather than inline literals, so translators and the
//! publication machinery agree on the supported set.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An ISO 639-1 language code, lowercased.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Build a code from a string, normalizing to lowercase.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read-only lookup of the languages the registry supports.
///
/// Constructed once at startup from seed data and shared via `Arc`;
/// concurrent reads from multiple scopes are safe because the table is
/// never mutated after construction. Invalidation is an administrative
/// action that rebuilds the cache, not an in-place edit.
#[derive(Debug, Clone)]
pub struct LanguageCache {
    /// code -> display order (lower sorts first in UI lists).
    order: HashMap<LanguageCode, i32>,
}

impl LanguageCache {
    /// Build a cache from (code, order) seed pairs.
    pub fn new(seed: impl IntoIterator<Item = (LanguageCode, i32)>) -> Self {
        Self {
            order: seed.into_iter().collect(),
        }
    }

    /// Whether the given code is a supported registry language.
    pub fn contains(&self, code: &LanguageCode) -> bool {
        self.order.contains_key(code)
    }

    /// Display order for a supported language.
    pub fn order_of(&self, code: &LanguageCode) -> Option<i32> {
        self.order.get(code).copied()
    }

    /// All supported codes, sorted by display order.
    pub fn codes(&self) -> Vec<LanguageCode> {
        let mut entries: Vec<_> = self.order.iter().collect();
        entries.sort_by_key(|(code, order)| (**order, (*code).clone()));
        entries.into_iter().map(|(code, _)| code.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
