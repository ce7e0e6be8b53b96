//! Change-tracked saver
//!
//! A [`Saver`] manages one create-or-update transaction against a single
//! record plus its audit trail. It is opened in create mode (no existing
//! record) or update mode (an existing record, whose content is snapshotted
//! as the original), mutated by the caller, and then either committed or
//! discarded. Nothing is written before commit, so discarding needs no
//! rollback.
//!
//! Commit order:
//!
//! 1. the `finalize` hook, which may reject the change;
//! 2. the modified timestamp is overwritten;
//! 3. the record is upserted (revision-checked where the store supports it);
//! 4. the redacted diff against the original is appended as an audit entry;
//! 5. buffered attachment deletions, then additions, are flushed.
//!
//! # Example
//!
//! ```rust,ignore
//! use docsaver::identity::Identity;
//! use docsaver::saver::{PlainKind, Saver};
//! use docsaver::storage::MemoryStore;
//!
//! let store = MemoryStore::new();
//! let identity = Identity::user("admin");
//! let committed = Saver::create(&store, &identity, PlainKind::new("note"))?
//!     .scope(|saver| {
//!         saver.set("title", "Hello")?;
//!         Ok(())
//!     })?;
//! ```

mod hooks;

pub use hooks::{PlainKind, SaverHooks};

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::{debug, warn};

use crate::audit::{diff, AuditEntry, Operation};
use crate::error::{SaverError, SaverResult};
use crate::identity::IdentityProvider;
use crate::models::{now, Fields, Record, RecordId};
use crate::storage::{validate_attachment_name, RecordStore};

/// An attachment waiting to be written after the record commit
#[derive(Debug, Clone)]
struct PendingAttachment {
    filename: String,
    content: Vec<u8>,
    content_type: String,
}

/// Outcome of a successful commit
#[derive(Debug, Clone)]
pub struct Committed {
    /// The record as stored, including its latest revision token
    pub record: Record,
    /// The audit entry written for this change
    pub entry: AuditEntry,
}

/// Scoped create-or-update transaction on one record
pub struct Saver<'a, K: SaverHooks> {
    store: &'a dyn RecordStore,
    identity: &'a dyn IdentityProvider,
    kind: K,
    record: Record,
    original: Fields,
    is_new: bool,
    delete_attachments: BTreeSet<String>,
    add_attachments: Vec<PendingAttachment>,
}

impl<'a, K: SaverHooks> Saver<'a, K> {
    /// Open in create mode when `existing` is `None`, else in update mode
    pub fn open(
        store: &'a dyn RecordStore,
        identity: &'a dyn IdentityProvider,
        kind: K,
        existing: Option<Record>,
    ) -> SaverResult<Self> {
        match existing {
            None => Self::create(store, identity, kind),
            Some(record) => Self::update(store, identity, kind, record),
        }
    }

    /// Start a new record with a fresh identifier and creation timestamp
    pub fn create(
        store: &'a dyn RecordStore,
        identity: &'a dyn IdentityProvider,
        mut kind: K,
    ) -> SaverResult<Self> {
        let mut record = Record::new(kind.doctype());
        kind.initialize(&mut record)?;
        Ok(Self::start(store, identity, kind, record, Fields::new(), true))
    }

    /// Take over an existing record; its current content becomes the original
    pub fn update(
        store: &'a dyn RecordStore,
        identity: &'a dyn IdentityProvider,
        kind: K,
        record: Record,
    ) -> SaverResult<Self> {
        if record.doctype != kind.doctype() {
            return Err(SaverError::Validation(format!(
                "Record {} is a '{}', not a '{}'",
                record.id,
                record.doctype,
                kind.doctype()
            )));
        }
        let original = record.to_document();
        Ok(Self::start(store, identity, kind, record, original, false))
    }

    /// Fetch a record from the store and open it in update mode
    pub fn load(
        store: &'a dyn RecordStore,
        identity: &'a dyn IdentityProvider,
        kind: K,
        id: RecordId,
    ) -> SaverResult<Self> {
        let record = store.fetch(id)?;
        Self::update(store, identity, kind, record)
    }

    fn start(
        store: &'a dyn RecordStore,
        identity: &'a dyn IdentityProvider,
        kind: K,
        record: Record,
        original: Fields,
        is_new: bool,
    ) -> Self {
        let mut saver = Self {
            store,
            identity,
            kind,
            record,
            original,
            is_new,
            delete_attachments: BTreeSet::new(),
            add_attachments: Vec::new(),
        };
        saver.kind.prepare(&saver.record);
        saver
    }

    /// Identifier of the record being saved
    pub fn id(&self) -> RecordId {
        self.record.id
    }

    /// True in create mode
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// The working copy
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Snapshot of the record content when the saver was opened
    pub fn original(&self) -> &Fields {
        &self.original
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    pub(crate) fn store(&self) -> &'a dyn RecordStore {
        self.store
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.record.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.record.get_str(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> SaverResult<()> {
        self.record.set(key, value)?;
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.record.remove(key)
    }

    /// Queue an attachment to be stored after the record is committed
    pub fn add_attachment(
        &mut self,
        filename: impl Into<String>,
        content: Vec<u8>,
        content_type: impl Into<String>,
    ) -> SaverResult<()> {
        self.require_attachments()?;
        let filename = filename.into();
        validate_attachment_name(&filename)?;

        self.add_attachments.retain(|a| a.filename != filename);
        self.add_attachments.push(PendingAttachment {
            filename,
            content,
            content_type: content_type.into(),
        });
        Ok(())
    }

    /// Queue removal of an attachment
    ///
    /// Removing a name that was only queued in this scope just drops it
    /// from the queue.
    pub fn delete_attachment(&mut self, filename: &str) -> SaverResult<()> {
        self.require_attachments()?;

        let queued = self.add_attachments.len();
        self.add_attachments.retain(|a| a.filename != filename);
        let was_queued = self.add_attachments.len() != queued;

        if self.record.attachments.contains_key(filename) {
            self.delete_attachments.insert(filename.to_string());
        } else if !was_queued {
            return Err(SaverError::attachment_not_found(filename));
        }
        Ok(())
    }

    fn require_attachments(&self) -> SaverResult<()> {
        if self.store.supports_attachments() {
            Ok(())
        } else {
            Err(SaverError::Unsupported(
                "this store does not support attachments".into(),
            ))
        }
    }

    /// Run `body` against this saver, then commit on success or discard on error
    ///
    /// The error from `body` is returned unchanged and nothing is written.
    pub fn scope<F>(mut self, body: F) -> SaverResult<Committed>
    where
        F: FnOnce(&mut Self) -> SaverResult<()>,
    {
        match body(&mut self) {
            Ok(()) => self.commit(),
            Err(e) => {
                self.discard();
                Err(e)
            }
        }
    }

    /// Drop all changes without writing anything
    pub fn discard(self) {
        debug!(id = %self.record.id, doctype = %self.record.doctype, "saver discarded");
    }

    /// Finalize, persist the record, then write the audit entry
    pub fn commit(self) -> SaverResult<Committed> {
        let Self {
            store,
            identity,
            mut kind,
            mut record,
            original,
            is_new,
            delete_attachments,
            add_attachments,
        } = self;

        kind.finalize(&mut record, store)?;
        record.doctype = kind.doctype().to_string();
        record.modified = now();

        if let Err(e) = store.upsert(&mut record) {
            warn!(id = %record.id, error = %e, "record commit failed");
            return Err(e);
        }

        let operation = if is_new {
            Operation::Create
        } else {
            Operation::Update
        };
        let changes = diff(&original, &record.to_document(), &kind.policy());
        let entry = AuditEntry::new(&record, operation, changes, identity);
        store.append(&entry)?;

        for filename in &delete_attachments {
            store.delete_attachment(&mut record, filename)?;
        }
        for attachment in &add_attachments {
            store.put_attachment(
                &mut record,
                &attachment.content,
                &attachment.filename,
                &attachment.content_type,
            )?;
        }

        debug!(
            id = %record.id,
            doctype = %record.doctype,
            operation = %operation,
            "record committed"
        );
        Ok(Committed { record, entry })
    }
}

#[cfg(test)]
mod tests;
