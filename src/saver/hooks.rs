//! Per-doctype customization of the saver lifecycle

use crate::audit::RedactionPolicy;
use crate::error::SaverResult;
use crate::models::Record;
use crate::storage::RecordStore;

/// Hooks run by a [`Saver`](super::Saver) at fixed points of its lifecycle
///
/// Every hook except [`doctype`](SaverHooks::doctype) has a no-op default.
pub trait SaverHooks {
    /// Type tag written to every record this saver commits
    fn doctype(&self) -> &str;

    /// Exclusion and hidden paths applied to the audit diff
    fn policy(&self) -> RedactionPolicy {
        RedactionPolicy::default()
    }

    /// Set required fields on a freshly created record
    fn initialize(&mut self, _record: &mut Record) -> SaverResult<()> {
        Ok(())
    }

    /// Runs once when the saver is opened, in both modes
    fn prepare(&mut self, _record: &Record) {}

    /// Final checks before commit; an error here aborts without any write
    fn finalize(&mut self, _record: &mut Record, _store: &dyn RecordStore) -> SaverResult<()> {
        Ok(())
    }
}

/// Hooks for documents with no type-specific rules
#[derive(Debug, Clone)]
pub struct PlainKind {
    doctype: String,
    policy: RedactionPolicy,
}

impl PlainKind {
    pub fn new(doctype: impl Into<String>) -> Self {
        Self {
            doctype: doctype.into(),
            policy: RedactionPolicy::default(),
        }
    }

    /// Use a custom redaction policy
    pub fn with_policy(mut self, policy: RedactionPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl SaverHooks for PlainKind {
    fn doctype(&self) -> &str {
        &self.doctype
    }

    fn policy(&self) -> RedactionPolicy {
        self.policy.clone()
    }
}
