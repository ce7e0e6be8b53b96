//! Record stores for docsaver
//!
//! The saver talks to persistence only through the [`RecordStore`] trait.
//! Two implementations are provided:
//!
//! - [`MemoryStore`]: records addressed by identifier only, last writer
//!   wins, audit entries kept as documents in the same store.
//! - [`FileStore`]: JSON-file backed, every write must carry the current
//!   revision token, audit entries go to a dedicated append-only log, and
//!   records may carry attachments.

pub mod file_io;
pub mod file_store;
pub mod memory;

pub use file_io::{read_json, write_bytes_atomic, write_json_atomic};
pub use file_store::FileStore;
pub use memory::MemoryStore;

use crate::audit::AuditEntry;
use crate::error::{SaverError, SaverResult};
use crate::models::{Record, RecordId, Revision};

/// Persistence layer consumed by the saver
pub trait RecordStore {
    /// Fetch a record by identifier
    ///
    /// # Errors
    ///
    /// `NotFound` if no record has this identifier.
    fn fetch(&self, id: RecordId) -> SaverResult<Record>;

    /// Insert a new record or replace the stored version
    ///
    /// Stores that maintain revision tokens check `record.rev` against the
    /// stored revision, fail with `Conflict` on mismatch, and write the new
    /// token back into `record` on success.
    fn upsert(&self, record: &mut Record) -> SaverResult<()>;

    /// Durably append an audit entry; entries are never overwritten
    fn append(&self, entry: &AuditEntry) -> SaverResult<()>;

    /// All records of one type
    fn list(&self, doctype: &str) -> SaverResult<Vec<Record>>;

    /// Audit entries for one record, newest first
    fn logs_for(&self, id: RecordId) -> SaverResult<Vec<AuditEntry>>;

    /// Whether the attachment operations are available
    fn supports_attachments(&self) -> bool {
        false
    }

    /// Store an attachment on a committed record, returning the new revision
    fn put_attachment(
        &self,
        record: &mut Record,
        content: &[u8],
        filename: &str,
        content_type: &str,
    ) -> SaverResult<Revision> {
        let _ = (record, content, filename, content_type);
        Err(SaverError::Unsupported(
            "this store does not support attachments".into(),
        ))
    }

    /// Remove an attachment from a committed record, returning the new revision
    fn delete_attachment(&self, record: &mut Record, filename: &str) -> SaverResult<Revision> {
        let _ = (record, filename);
        Err(SaverError::Unsupported(
            "this store does not support attachments".into(),
        ))
    }

    /// Read an attachment payload
    fn get_attachment(&self, id: RecordId, filename: &str) -> SaverResult<Vec<u8>> {
        let _ = (id, filename);
        Err(SaverError::Unsupported(
            "this store does not support attachments".into(),
        ))
    }
}

/// Reject attachment names that could escape the record's directory
pub(crate) fn validate_attachment_name(filename: &str) -> SaverResult<()> {
    let invalid = filename.is_empty()
        || filename == "."
        || filename == ".."
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains('\0');
    if invalid {
        return Err(SaverError::Validation(format!(
            "Invalid attachment filename: '{}'",
            filename
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_attachment_name() {
        assert!(validate_attachment_name("report.pdf").is_ok());
        assert!(validate_attachment_name("").is_err());
        assert!(validate_attachment_name("..").is_err());
        assert!(validate_attachment_name("../etc/passwd").is_err());
        assert!(validate_attachment_name("a\\b").is_err());
    }
}
