//! Exclusion and hidden key paths
//!
//! A [`RedactionPolicy`] decides, for every key path the diff engine visits,
//! whether the location is left out of the diff entirely (excluded) or
//! reported with its value(s) replaced by [`HIDDEN_MARKER`] (hidden).
//! Paths match exactly; a top-level field name is the one-segment path.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Substituted for the value of a hidden path
pub const HIDDEN_MARKER: &str = "<hidden>";

/// A location in a record's key hierarchy, outermost key first
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    /// Build a path from its segments
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parse a dotted path such as `profile.ssn`
    pub fn parse(dotted: &str) -> Self {
        Self::new(dotted.split('.').filter(|s| !s.is_empty()))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Does this path denote exactly the location `path`?
    pub fn matches(&self, path: &[&str]) -> bool {
        self.0.len() == path.len() && self.0.iter().zip(path).all(|(a, b)| a.as_str() == *b)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl From<&str> for KeyPath {
    fn from(dotted: &str) -> Self {
        Self::parse(dotted)
    }
}

/// Which key paths are excluded from, or hidden in, a diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactionPolicy {
    excluded: BTreeSet<KeyPath>,
    hidden: BTreeSet<KeyPath>,
}

impl Default for RedactionPolicy {
    /// The modified timestamp changes on every commit and is always excluded
    fn default() -> Self {
        Self::none().exclude(KeyPath::new(["modified"]))
    }
}

impl RedactionPolicy {
    /// A policy that reports everything verbatim
    pub fn none() -> Self {
        Self {
            excluded: BTreeSet::new(),
            hidden: BTreeSet::new(),
        }
    }

    /// Add an exclusion path
    pub fn exclude(mut self, path: impl Into<KeyPath>) -> Self {
        self.excluded.insert(path.into());
        self
    }

    /// Add a hidden path
    pub fn hide(mut self, path: impl Into<KeyPath>) -> Self {
        self.hidden.insert(path.into());
        self
    }

    /// Hide a top-level field by name
    pub fn hide_field(self, name: &str) -> Self {
        self.hide(KeyPath::new([name]))
    }

    pub fn is_excluded(&self, path: &[&str]) -> bool {
        self.excluded.iter().any(|p| p.matches(path))
    }

    pub fn is_hidden(&self, path: &[&str]) -> bool {
        self.hidden.iter().any(|p| p.matches(path))
    }

    /// The value to report at `path`
    ///
    /// The marker if `path` is hidden. Otherwise a copy in which every
    /// nested location that is excluded is dropped and every nested location
    /// that is hidden is masked.
    pub fn reported(&self, path: &[&str], value: &Value) -> Value {
        if self.is_hidden(path) {
            return Value::String(HIDDEN_MARKER.to_string());
        }
        match value {
            Value::Object(obj) => {
                let mut child_path = path.to_vec();
                let mut redacted = Map::new();
                for (key, child) in obj {
                    child_path.push(key.as_str());
                    if !self.is_excluded(&child_path) {
                        redacted.insert(key.clone(), self.reported(&child_path, child));
                    }
                    child_path.pop();
                }
                Value::Object(redacted)
            }
            other => other.clone(),
        }
    }
}
