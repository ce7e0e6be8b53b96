//! File-backed record store with revision checks
//!
//! Records are kept in `data/records.json` and written through on every
//! change. Each accepted write assigns a new revision token; a write that
//! does not carry the currently stored token is rejected with a conflict.
//! Audit entries go to the append-only `audit.log`, attachment payloads to
//! `attachments/<record id>/<filename>`.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockWriteGuard};

use tracing::{debug, warn};

use crate::audit::{AuditEntry, AuditLog};
use crate::config::paths::SaverPaths;
use crate::error::{SaverError, SaverResult};
use crate::models::{AttachmentInfo, Record, RecordId, Revision};

use super::file_io::{read_json, write_bytes_atomic, write_json_atomic};
use super::{validate_attachment_name, RecordStore};

/// Serializable record data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct RecordData {
    records: Vec<Record>,
}

/// Record store persisted as JSON files
pub struct FileStore {
    records_path: PathBuf,
    attachments_dir: PathBuf,
    log: AuditLog,
    data: RwLock<HashMap<RecordId, Record>>,
}

impl FileStore {
    /// Open the store rooted at `paths`, creating directories as needed
    pub fn open(paths: &SaverPaths) -> SaverResult<Self> {
        paths.ensure_directories()?;

        let store = Self {
            records_path: paths.records_file(),
            attachments_dir: paths.attachments_dir(),
            log: AuditLog::new(paths.audit_log()),
            data: RwLock::new(HashMap::new()),
        };
        store.load()?;
        Ok(store)
    }

    /// Reload records from disk
    pub fn load(&self) -> SaverResult<()> {
        let file_data: RecordData = read_json(&self.records_path)?;

        let mut data = self.lock_write()?;
        data.clear();
        for record in file_data.records {
            data.insert(record.id, record);
        }

        debug!(count = data.len(), path = %self.records_path.display(), "loaded records");
        Ok(())
    }

    /// The audit log backing this store
    pub fn audit_log(&self) -> &AuditLog {
        &self.log
    }

    /// Number of stored records
    pub fn count(&self) -> SaverResult<usize> {
        let data = self
            .data
            .read()
            .map_err(|e| SaverError::Storage(format!("Failed to acquire read lock: {}", e)))?;
        Ok(data.len())
    }

    fn lock_write(&self) -> SaverResult<RwLockWriteGuard<'_, HashMap<RecordId, Record>>> {
        self.data
            .write()
            .map_err(|e| SaverError::Storage(format!("Failed to acquire write lock: {}", e)))
    }

    fn save(&self, data: &HashMap<RecordId, Record>) -> SaverResult<()> {
        let mut records: Vec<Record> = data.values().cloned().collect();
        records.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));
        write_json_atomic(&self.records_path, &RecordData { records })
    }

    fn attachment_path(&self, id: RecordId, filename: &str) -> PathBuf {
        self.attachments_dir.join(id.to_string()).join(filename)
    }

    /// Check that `record` carries the stored revision
    fn check_revision(stored: Option<&Record>, record: &Record) -> SaverResult<()> {
        let stored_rev = stored.and_then(|s| s.rev.as_ref());
        if stored_rev == record.rev.as_ref() {
            return Ok(());
        }

        let describe = |rev: Option<&Revision>| {
            rev.map(|r| r.to_string())
                .unwrap_or_else(|| "(none)".to_string())
        };
        warn!(id = %record.id, "write conflict: stale revision");
        Err(SaverError::Conflict {
            id: record.id.to_string(),
            expected: describe(record.rev.as_ref()),
            actual: describe(stored_rev),
        })
    }

    /// Store `updated` under a fresh revision and persist; on a failed
    /// write the previous in-memory state is restored
    fn commit_locked(
        &self,
        data: &mut HashMap<RecordId, Record>,
        mut updated: Record,
    ) -> SaverResult<Revision> {
        let rev = Revision::successor(data.get(&updated.id).and_then(|r| r.rev.as_ref()));
        updated.rev = Some(rev.clone());

        let id = updated.id;
        let previous = data.insert(id, updated);
        if let Err(e) = self.save(data) {
            match previous {
                Some(previous) => data.insert(id, previous),
                None => data.remove(&id),
            };
            return Err(e);
        }
        Ok(rev)
    }
}

impl RecordStore for FileStore {
    fn fetch(&self, id: RecordId) -> SaverResult<Record> {
        let data = self
            .data
            .read()
            .map_err(|e| SaverError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        data.get(&id)
            .cloned()
            .ok_or_else(|| SaverError::record_not_found(id.to_string()))
    }

    fn upsert(&self, record: &mut Record) -> SaverResult<()> {
        let mut data = self.lock_write()?;
        Self::check_revision(data.get(&record.id), record)?;

        let rev = self.commit_locked(&mut data, record.clone())?;
        debug!(id = %record.id, rev = %rev, "record written");
        record.rev = Some(rev);
        Ok(())
    }

    fn append(&self, entry: &AuditEntry) -> SaverResult<()> {
        self.log.append(entry)
    }

    fn list(&self, doctype: &str) -> SaverResult<Vec<Record>> {
        let data = self
            .data
            .read()
            .map_err(|e| SaverError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut records: Vec<_> = data
            .values()
            .filter(|r| r.doctype == doctype)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));
        Ok(records)
    }

    fn logs_for(&self, id: RecordId) -> SaverResult<Vec<AuditEntry>> {
        self.log.read_for(id)
    }

    fn supports_attachments(&self) -> bool {
        true
    }

    fn put_attachment(
        &self,
        record: &mut Record,
        content: &[u8],
        filename: &str,
        content_type: &str,
    ) -> SaverResult<Revision> {
        validate_attachment_name(filename)?;

        let mut data = self.lock_write()?;
        let stored = data
            .get(&record.id)
            .ok_or_else(|| SaverError::record_not_found(record.id.to_string()))?;
        Self::check_revision(Some(stored), record)?;

        write_bytes_atomic(self.attachment_path(record.id, filename), content)?;

        let mut updated = stored.clone();
        let info = AttachmentInfo {
            content_type: content_type.to_string(),
            length: content.len() as u64,
        };
        updated.attachments.insert(filename.to_string(), info.clone());

        let rev = self.commit_locked(&mut data, updated)?;
        record.attachments.insert(filename.to_string(), info);
        record.rev = Some(rev.clone());
        debug!(id = %record.id, filename, rev = %rev, "attachment stored");
        Ok(rev)
    }

    fn delete_attachment(&self, record: &mut Record, filename: &str) -> SaverResult<Revision> {
        validate_attachment_name(filename)?;

        let mut data = self.lock_write()?;
        let stored = data
            .get(&record.id)
            .ok_or_else(|| SaverError::record_not_found(record.id.to_string()))?;
        Self::check_revision(Some(stored), record)?;
        if !stored.attachments.contains_key(filename) {
            return Err(SaverError::attachment_not_found(filename));
        }

        let mut updated = stored.clone();
        updated.attachments.remove(filename);
        let rev = self.commit_locked(&mut data, updated)?;

        let path = self.attachment_path(record.id, filename);
        if let Err(e) = fs::remove_file(&path) {
            warn!(path = %path.display(), error = %e, "failed to remove attachment payload");
        }

        record.attachments.remove(filename);
        record.rev = Some(rev.clone());
        debug!(id = %record.id, filename, rev = %rev, "attachment deleted");
        Ok(rev)
    }

    fn get_attachment(&self, id: RecordId, filename: &str) -> SaverResult<Vec<u8>> {
        validate_attachment_name(filename)?;

        let record = self.fetch(id)?;
        if !record.attachments.contains_key(filename) {
            return Err(SaverError::attachment_not_found(filename));
        }
        fs::read(self.attachment_path(id, filename))
            .map_err(|e| SaverError::Storage(format!("Failed to read attachment {}: {}", filename, e)))
    }
}
