//! Revision tokens for optimistic concurrency control
//!
//! A revision is rendered as `<generation>-<random hex>`. The generation
//! increases by one on every accepted write; the random part makes two
//! independent writes of the same generation distinguishable.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque token identifying one exact version of a stored record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
    /// Revision assigned by the first write of a record
    pub fn first() -> Self {
        Self::with_generation(1)
    }

    /// Revision following this one
    pub fn next(&self) -> Self {
        Self::with_generation(self.generation() + 1)
    }

    /// Revision following `current`, or the first one for unsaved records
    pub fn successor(current: Option<&Revision>) -> Self {
        current.map(Revision::next).unwrap_or_else(Revision::first)
    }

    /// Generation number; zero if the token is malformed
    pub fn generation(&self) -> u64 {
        self.0
            .split('-')
            .next()
            .and_then(|g| g.parse().ok())
            .unwrap_or(0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn with_generation(generation: u64) -> Self {
        Self(format!("{}-{}", generation, Uuid::new_v4().simple()))
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Revision {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
