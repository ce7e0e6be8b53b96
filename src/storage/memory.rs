//! In-memory record store
//!
//! Records and audit entries live side by side as JSON documents keyed by
//! identifier; audit entries carry the `log` doctype. Writes are
//! last-writer-wins and no revision tokens are maintained.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use serde_json::Value;

use crate::audit::AuditEntry;
use crate::error::{SaverError, SaverResult};
use crate::models::{Record, RecordId};

use super::RecordStore;

/// Type tag of audit entry documents
pub const DOCTYPE_LOG: &str = "log";

/// Document store held in memory
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<String, Value>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful writes (upserts and appends) so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of documents of every kind
    pub fn document_count(&self) -> SaverResult<usize> {
        Ok(self.read()?.len())
    }

    fn read(&self) -> SaverResult<std::sync::RwLockReadGuard<'_, HashMap<String, Value>>> {
        self.documents
            .read()
            .map_err(|e| SaverError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> SaverResult<std::sync::RwLockWriteGuard<'_, HashMap<String, Value>>> {
        self.documents
            .write()
            .map_err(|e| SaverError::Storage(format!("Failed to acquire write lock: {}", e)))
    }

    fn is_log(doc: &Value) -> bool {
        doc.get("doctype").and_then(Value::as_str) == Some(DOCTYPE_LOG)
    }
}

impl RecordStore for MemoryStore {
    fn fetch(&self, id: RecordId) -> SaverResult<Record> {
        let documents = self.read()?;
        match documents.get(&id.to_string()) {
            Some(doc) if !Self::is_log(doc) => Ok(serde_json::from_value(doc.clone())?),
            _ => Err(SaverError::record_not_found(id.to_string())),
        }
    }

    fn upsert(&self, record: &mut Record) -> SaverResult<()> {
        if record.doctype == DOCTYPE_LOG {
            return Err(SaverError::Validation(format!(
                "Doctype '{}' is reserved for audit entries",
                DOCTYPE_LOG
            )));
        }
        let doc = serde_json::to_value(&*record)?;
        self.write()?.insert(record.id.to_string(), doc);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn append(&self, entry: &AuditEntry) -> SaverResult<()> {
        let mut doc = serde_json::to_value(entry)?;
        if let Value::Object(obj) = &mut doc {
            obj.insert("log_doctype".into(), Value::String(entry.doctype.clone()));
            obj.insert("doctype".into(), Value::String(DOCTYPE_LOG.into()));
        }

        let mut documents = self.write()?;
        let key = entry.id.to_string();
        if documents.contains_key(&key) {
            return Err(SaverError::Duplicate {
                entity_type: "Audit entry",
                identifier: key,
            });
        }
        documents.insert(key, doc);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn list(&self, doctype: &str) -> SaverResult<Vec<Record>> {
        let documents = self.read()?;
        let mut records = Vec::new();
        for doc in documents.values() {
            if doc.get("doctype").and_then(Value::as_str) == Some(doctype) && !Self::is_log(doc) {
                records.push(serde_json::from_value::<Record>(doc.clone())?);
            }
        }
        records.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));
        Ok(records)
    }

    fn logs_for(&self, id: RecordId) -> SaverResult<Vec<AuditEntry>> {
        let docid = id.to_string();
        let documents = self.read()?;
        let mut entries = Vec::new();
        for doc in documents.values() {
            if Self::is_log(doc) && doc.get("docid").and_then(Value::as_str) == Some(docid.as_str()) {
                let mut doc = doc.clone();
                if let Value::Object(obj) = &mut doc {
                    if let Some(original) = obj.remove("log_doctype") {
                        obj.insert("doctype".into(), original);
                    }
                }
                entries.push(serde_json::from_value::<AuditEntry>(doc)?);
            }
        }
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{Diff, Operation};
    use crate::identity::Identity;

    #[test]
    fn test_upsert_and_fetch() {
        let store = MemoryStore::new();
        let mut record = Record::new("note");
        record.set("title", "hello").unwrap();

        store.upsert(&mut record).unwrap();

        let fetched = store.fetch(record.id).unwrap();
        assert_eq!(fetched, record);
        assert!(fetched.rev.is_none());
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn test_fetch_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.fetch(RecordId::new()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_last_writer_wins() {
        let store = MemoryStore::new();
        let mut record = Record::new("note");
        store.upsert(&mut record).unwrap();

        let mut first = store.fetch(record.id).unwrap();
        let mut second = store.fetch(record.id).unwrap();
        first.set("title", "first").unwrap();
        second.set("title", "second").unwrap();
        store.upsert(&mut first).unwrap();
        store.upsert(&mut second).unwrap();

        let stored = store.fetch(record.id).unwrap();
        assert_eq!(stored.get_str("title"), Some("second"));
    }

    #[test]
    fn test_log_documents_share_the_store() {
        let store = MemoryStore::new();
        let mut record = Record::new("note");
        store.upsert(&mut record).unwrap();

        let entry = AuditEntry::new(&record, Operation::Create, Diff::default(), &Identity::anonymous());
        store.append(&entry).unwrap();

        assert_eq!(store.document_count().unwrap(), 2);
        assert!(store.fetch(RecordId::from(*entry.id.as_uuid())).is_err());
        assert_eq!(store.list("note").unwrap().len(), 1);

        let logs = store.logs_for(record.id).unwrap();
        assert_eq!(logs, vec![entry.clone()]);

        // Entries are immutable
        assert!(store.append(&entry).is_err());
    }
}
