use std::fs;

use serde_json::json;
use tempfile::TempDir;

use super::*;
use crate::audit::RedactionPolicy;
use crate::config::SaverPaths;
use crate::identity::Identity;
use crate::storage::{FileStore, MemoryStore};

fn file_store() -> (TempDir, SaverPaths, FileStore) {
    let temp_dir = TempDir::new().unwrap();
    let paths = SaverPaths::with_base_dir(temp_dir.path().to_path_buf());
    let store = FileStore::open(&paths).unwrap();
    (temp_dir, paths, store)
}

/// Store a record directly, bypassing the saver
fn seed(store: &dyn RecordStore, doctype: &str, fields: serde_json::Value) -> Record {
    let mut record = Record::new(doctype);
    if let serde_json::Value::Object(map) = fields {
        for (key, value) in map {
            record.set(key, value).unwrap();
        }
    }
    store.upsert(&mut record).unwrap();
    record
}

/// Rejects every commit
struct Rejecting;

impl SaverHooks for Rejecting {
    fn doctype(&self) -> &str {
        "note"
    }

    fn finalize(&mut self, _record: &mut Record, _store: &dyn RecordStore) -> SaverResult<()> {
        Err(SaverError::Validation("title is required".into()))
    }
}

/// Counts hook calls and fills a default on create
#[derive(Default)]
struct Counting {
    initialized: usize,
    prepared: usize,
}

impl SaverHooks for Counting {
    fn doctype(&self) -> &str {
        "note"
    }

    fn initialize(&mut self, record: &mut Record) -> SaverResult<()> {
        self.initialized += 1;
        record.set("status", "draft")?;
        Ok(())
    }

    fn prepare(&mut self, _record: &Record) {
        self.prepared += 1;
    }
}

#[test]
fn test_create_reports_every_field_as_added() {
    let store = MemoryStore::new();
    let identity = Identity::anonymous();

    let committed = Saver::create(&store, &identity, PlainKind::new("user"))
        .unwrap()
        .scope(|saver| saver.set("name", "alice"))
        .unwrap();

    let record = &committed.record;
    assert_eq!(record.get_str("name"), Some("alice"));
    assert_eq!(record.doctype, "user");
    assert!(record.modified >= record.created);

    let changes = &committed.entry.diff;
    assert_eq!(changes.added["name"], json!("alice"));
    assert_eq!(changes.added["doctype"], json!("user"));
    assert!(changes.added.contains_key("created"));
    assert!(!changes.added.contains_key("modified"));
    assert!(changes.removed.is_empty());
    assert!(changes.updated.is_empty());

    assert_eq!(committed.entry.operation, Operation::Create);
    assert_eq!(store.fetch(record.id).unwrap(), *record);
}

#[test]
fn test_update_reports_changed_value() {
    let store = MemoryStore::new();
    let identity = Identity::anonymous();
    let record = seed(&store, "user", json!({"role": "user"}));

    let committed = Saver::update(&store, &identity, PlainKind::new("user"), record)
        .unwrap()
        .scope(|saver| saver.set("role", "admin"))
        .unwrap();

    assert_eq!(
        serde_json::to_value(&committed.entry.diff).unwrap(),
        json!({"updated": {"role": {"old_value": "user", "new_value": "admin"}}})
    );
    assert_eq!(committed.entry.operation, Operation::Update);
}

#[test]
fn test_hidden_field_masks_values() {
    let store = MemoryStore::new();
    let identity = Identity::anonymous();
    let record = seed(&store, "user", json!({"secret": "s1", "name": "bob"}));
    let kind = PlainKind::new("user").with_policy(RedactionPolicy::default().hide("secret"));

    let committed = Saver::update(&store, &identity, kind, record)
        .unwrap()
        .scope(|saver| {
            saver.set("secret", "s2")?;
            saver.set("name", "bob2")
        })
        .unwrap();

    assert_eq!(
        serde_json::to_value(&committed.entry.diff).unwrap(),
        json!({"updated": {
            "secret": "<hidden>",
            "name": {"old_value": "bob", "new_value": "bob2"}
        }})
    );
    let line = serde_json::to_string(&committed.entry).unwrap();
    assert!(!line.contains("s2"));
}

#[test]
fn test_nested_redaction_applies_to_created_subtrees() {
    let store = MemoryStore::new();
    let identity = Identity::anonymous();
    let kind = PlainKind::new("user").with_policy(
        RedactionPolicy::default()
            .hide("profile.ssn")
            .exclude("profile.notes"),
    );

    let committed = Saver::create(&store, &identity, kind)
        .unwrap()
        .scope(|saver| {
            saver.set(
                "profile",
                json!({"ssn": "123-45-6789", "notes": "private", "city": "Oslo"}),
            )
        })
        .unwrap();

    assert_eq!(
        committed.entry.diff.added["profile"],
        json!({"ssn": "<hidden>", "city": "Oslo"})
    );
    let line = serde_json::to_string(&committed.entry).unwrap();
    assert!(!line.contains("123-45-6789"));
    assert!(!line.contains("private"));
    // The stored record keeps the real values
    assert_eq!(
        store.fetch(committed.record.id).unwrap().get("profile").unwrap()["ssn"],
        json!("123-45-6789")
    );
}

#[test]
fn test_commit_without_changes_writes_one_empty_entry() {
    let store = MemoryStore::new();
    let identity = Identity::anonymous();
    let record = seed(&store, "note", json!({"title": "same"}));
    let before = record.modified;
    let writes = store.write_count();

    std::thread::sleep(std::time::Duration::from_millis(5));
    let committed = Saver::update(&store, &identity, PlainKind::new("note"), record)
        .unwrap()
        .commit()
        .unwrap();

    assert!(committed.entry.diff.is_empty());
    assert_eq!(serde_json::to_value(&committed.entry.diff).unwrap(), json!({}));
    assert!(committed.record.modified > before);
    // One upsert plus one audit entry
    assert_eq!(store.write_count(), writes + 2);
    assert_eq!(store.logs_for(committed.record.id).unwrap().len(), 1);
}

#[test]
fn test_failed_scope_writes_nothing() {
    let store = MemoryStore::new();
    let identity = Identity::anonymous();
    let record = seed(&store, "note", json!({"title": "kept"}));
    let writes = store.write_count();

    let err = Saver::update(&store, &identity, PlainKind::new("note"), record.clone())
        .unwrap()
        .scope(|saver| {
            saver.set("title", "lost")?;
            Err(SaverError::Validation("caller gave up".into()))
        })
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(store.write_count(), writes);
    assert_eq!(store.fetch(record.id).unwrap(), record);
    assert!(store.logs_for(record.id).unwrap().is_empty());
}

#[test]
fn test_finalize_error_writes_nothing() {
    let store = MemoryStore::new();
    let identity = Identity::anonymous();

    let err = Saver::create(&store, &identity, Rejecting)
        .unwrap()
        .scope(|saver| saver.set("body", "text"))
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(store.write_count(), 0);
    assert_eq!(store.document_count().unwrap(), 0);
}

#[test]
fn test_hooks_run_once() {
    let store = MemoryStore::new();
    let identity = Identity::anonymous();

    let saver = Saver::create(&store, &identity, Counting::default()).unwrap();
    assert_eq!(saver.kind().initialized, 1);
    assert_eq!(saver.kind().prepared, 1);
    assert_eq!(saver.get_str("status"), Some("draft"));
    let committed = saver.commit().unwrap();

    let saver = Saver::update(&store, &identity, Counting::default(), committed.record).unwrap();
    assert_eq!(saver.kind().initialized, 0);
    assert_eq!(saver.kind().prepared, 1);
    saver.discard();
}

#[test]
fn test_open_picks_mode() {
    let store = MemoryStore::new();
    let identity = Identity::anonymous();

    let saver = Saver::open(&store, &identity, PlainKind::new("note"), None).unwrap();
    assert!(saver.is_new());
    assert!(saver.original().is_empty());
    saver.discard();

    let record = seed(&store, "note", json!({"title": "t"}));
    let saver = Saver::open(&store, &identity, PlainKind::new("note"), Some(record.clone())).unwrap();
    assert!(!saver.is_new());
    assert_eq!(saver.id(), record.id);
    assert_eq!(saver.original()["title"], json!("t"));
}

#[test]
fn test_update_rejects_other_doctype() {
    let store = MemoryStore::new();
    let identity = Identity::anonymous();
    let record = seed(&store, "note", json!({}));

    let result = Saver::update(&store, &identity, PlainKind::new("user"), record);
    assert!(result.err().unwrap().is_validation());
}

#[test]
fn test_load_missing_record_is_not_found() {
    let store = MemoryStore::new();
    let identity = Identity::anonymous();

    let result = Saver::load(&store, &identity, PlainKind::new("note"), RecordId::new());
    assert!(result.err().unwrap().is_not_found());
}

#[test]
fn test_identity_recorded() {
    let store = MemoryStore::new();
    let identity = Identity::user("alice").with_origin("10.0.0.1", "curl/8.0");

    let committed = Saver::create(&store, &identity, PlainKind::new("note"))
        .unwrap()
        .commit()
        .unwrap();

    let entry = &committed.entry;
    assert_eq!(entry.username.as_deref(), Some("alice"));
    assert_eq!(entry.remote_addr.as_deref(), Some("10.0.0.1"));
    assert_eq!(entry.user_agent.as_deref(), Some("curl/8.0"));
    assert_eq!(entry.docid, committed.record.id);
}

#[test]
fn test_conflict_leaves_stored_record_unchanged() {
    let (_temp_dir, paths, store) = file_store();
    let identity = Identity::user("admin");
    let record = seed(&store, "note", json!({"title": "v1"}));

    let first = Saver::load(&store, &identity, PlainKind::new("note"), record.id).unwrap();
    let second = Saver::load(&store, &identity, PlainKind::new("note"), record.id).unwrap();

    first
        .scope(|saver| saver.set("title", "first"))
        .unwrap();
    let on_disk = fs::read(paths.records_file()).unwrap();
    let log_entries = store.audit_log().entry_count().unwrap();

    let err = second
        .scope(|saver| saver.set("title", "second"))
        .unwrap_err();

    assert!(err.is_conflict());
    assert_eq!(fs::read(paths.records_file()).unwrap(), on_disk);
    assert_eq!(store.audit_log().entry_count().unwrap(), log_entries);
    assert_eq!(store.fetch(record.id).unwrap().get_str("title"), Some("first"));
}

#[test]
fn test_attachments_flushed_after_commit() {
    let (_temp_dir, _paths, store) = file_store();
    let identity = Identity::anonymous();

    let committed = Saver::create(&store, &identity, PlainKind::new("note"))
        .unwrap()
        .scope(|saver| {
            saver.set("title", "with files")?;
            saver.add_attachment("a.txt", b"alpha".to_vec(), "text/plain")?;
            saver.add_attachment("b.txt", b"beta".to_vec(), "text/plain")
        })
        .unwrap();

    let record = committed.record;
    // One record write plus one per attachment
    assert_eq!(record.rev.as_ref().unwrap().generation(), 3);
    assert_eq!(store.fetch(record.id).unwrap(), record);
    assert_eq!(store.get_attachment(record.id, "b.txt").unwrap(), b"beta");
    // Attachments are not part of the diff
    assert!(!committed.entry.diff.added.contains_key("_attachments"));

    let committed = Saver::update(&store, &identity, PlainKind::new("note"), record)
        .unwrap()
        .scope(|saver| {
            saver.delete_attachment("a.txt")?;
            saver.add_attachment("c.txt", b"gamma".to_vec(), "text/plain")
        })
        .unwrap();

    let record = committed.record;
    assert_eq!(record.rev.as_ref().unwrap().generation(), 6);
    assert_eq!(
        record.attachments.keys().cloned().collect::<Vec<_>>(),
        vec!["b.txt".to_string(), "c.txt".to_string()]
    );
    assert!(committed.entry.diff.is_empty());
}

#[test]
fn test_delete_unknown_attachment() {
    let (_temp_dir, _paths, store) = file_store();
    let identity = Identity::anonymous();

    let mut saver = Saver::create(&store, &identity, PlainKind::new("note")).unwrap();
    assert!(saver.delete_attachment("missing.txt").unwrap_err().is_not_found());

    // Dropping a queued attachment just cancels it
    saver.add_attachment("draft.txt", b"x".to_vec(), "text/plain").unwrap();
    saver.delete_attachment("draft.txt").unwrap();
    let committed = saver.commit().unwrap();
    assert!(committed.record.attachments.is_empty());
}

#[test]
fn test_attachments_need_capable_store() {
    let store = MemoryStore::new();
    let identity = Identity::anonymous();

    let mut saver = Saver::create(&store, &identity, PlainKind::new("note")).unwrap();
    let err = saver
        .add_attachment("a.txt", b"alpha".to_vec(), "text/plain")
        .unwrap_err();
    assert!(matches!(err, SaverError::Unsupported(_)));
}
