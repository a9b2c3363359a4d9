//! # pdes-types::params
//!
//! A small string-keyed parameter set attached to every configured
//! component. Parameters travel with the `ConfigGraph` from the front end
//! through partitioning to component construction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// An ordered set of string parameters for one component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a parameter. An existing key is only replaced when
    /// `overwrite` is set; returns whether the map changed.
    pub fn insert(&mut self, key: &str, value: &str, overwrite: bool) -> bool {
        if !overwrite && self.0.contains_key(key) {
            return false;
        }
        self.0.insert(key.to_string(), value.to_string());
        true
    }

    /// Merges another parameter set into this one, overwriting duplicates.
    pub fn extend(&mut self, other: &Params) {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), v.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Returns a parameter parsed into `T`, or `default` when the key is
    /// absent or fails to parse.
    pub fn get_parsed_or<T: FromStr>(&self, key: &str, default: T) -> T {
        self.get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrite_is_respected() {
        let mut p = Params::new();
        assert!(p.insert("depth", "4", false));
        assert!(!p.insert("depth", "8", false));
        assert_eq!(p.get("depth"), Some("4"));
        assert!(p.insert("depth", "8", true));
        assert_eq!(p.get_parsed_or("depth", 0u32), 8);
    }

    #[test]
    fn parsed_lookup_falls_back() {
        let mut p = Params::new();
        p.insert("count", "not-a-number", true);
        assert_eq!(p.get_parsed_or("count", 3u64), 3);
        assert_eq!(p.get_parsed_or("missing", 5u64), 5);
    }
}
