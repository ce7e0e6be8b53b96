//! Audit entry data structures
//!
//! Defines the operation kinds and the entry format written once per
//! committed change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::diff::Diff;
use crate::identity::IdentityProvider;
use crate::models::{now, LogEntryId, Record, RecordId};

/// Types of operations that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Record was created
    Create,
    /// Record was updated
    Update,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Update => write!(f, "UPDATE"),
        }
    }
}

/// A single audit log entry
///
/// Immutable once written. The principal and request-origin fields are
/// `null` when the change was made outside a login or request context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Identifier of this entry
    pub id: LogEntryId,

    /// Identifier of the changed record
    pub docid: RecordId,

    /// Type tag of the changed record
    pub doctype: String,

    /// Type of operation performed
    pub operation: Operation,

    /// Redacted structural diff from the previous to the committed version
    pub diff: Diff,

    /// When the change was committed (UTC)
    pub timestamp: DateTime<Utc>,

    /// Acting principal
    pub username: Option<String>,

    /// Remote address of the request
    pub remote_addr: Option<String>,

    /// Client string of the request
    pub user_agent: Option<String>,
}

impl AuditEntry {
    /// Assemble the entry for a committed record
    pub fn new(
        record: &Record,
        operation: Operation,
        diff: Diff,
        identity: &dyn IdentityProvider,
    ) -> Self {
        let origin = identity.current_request_origin();
        Self {
            id: LogEntryId::new(),
            docid: record.id,
            doctype: record.doctype.clone(),
            operation,
            diff,
            timestamp: now(),
            username: identity.current_principal_name(),
            remote_addr: origin.as_ref().map(|o| o.remote_addr.clone()),
            user_agent: origin.map(|o| o.user_agent),
        }
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.operation,
            self.doctype,
            self.docid
        );

        if let Some(username) = &self.username {
            output.push_str(&format!(" by {}", username));
        }
        if let Some(addr) = &self.remote_addr {
            output.push_str(&format!(" from {}", addr));
        }

        for line in self.diff.summary() {
            output.push_str(&format!("\n  {}", line));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::Create.to_string(), "CREATE");
        assert_eq!(Operation::Update.to_string(), "UPDATE");
    }

    #[test]
    fn test_anonymous_entry_has_null_identity() {
        let record = Record::new("user");
        let entry = AuditEntry::new(&record, Operation::Create, Diff::default(), &Identity::anonymous());

        assert_eq!(entry.docid, record.id);
        assert_eq!(entry.doctype, "user");

        let value = serde_json::to_value(&entry).unwrap();
        assert!(value["username"].is_null());
        assert!(value["remote_addr"].is_null());
        assert!(value["user_agent"].is_null());
        assert_eq!(value["diff"], serde_json::json!({}));
    }

    #[test]
    fn test_entry_records_identity() {
        let record = Record::new("user");
        let identity = Identity::user("admin").with_origin("127.0.0.1", "pytest");
        let entry = AuditEntry::new(&record, Operation::Update, Diff::default(), &identity);

        assert_eq!(entry.username.as_deref(), Some("admin"));
        assert_eq!(entry.remote_addr.as_deref(), Some("127.0.0.1"));
        assert_eq!(entry.user_agent.as_deref(), Some("pytest"));
    }

    #[test]
    fn test_serialization() {
        let record = Record::new("user");
        let entry = AuditEntry::new(&record, Operation::Create, Diff::default(), &Identity::user("a"));

        let json = serde_json::to_string(&entry).unwrap();
        let deserialized: AuditEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, entry);
    }

    #[test]
    fn test_human_readable_format() {
        let record = Record::new("user");
        let mut diff = Diff::default();
        diff.added.insert("name".into(), serde_json::json!("alice"));
        let entry = AuditEntry::new(&record, Operation::Create, diff, &Identity::user("admin"));

        let formatted = entry.format_human_readable();
        assert!(formatted.contains("CREATE"));
        assert!(formatted.contains("user"));
        assert!(formatted.contains(&record.id.to_string()));
        assert!(formatted.contains("by admin"));
        assert!(formatted.contains("name: (added) -> \"alice\""));
    }
}
