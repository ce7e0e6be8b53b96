//! Audit logging system for docsaver
//!
//! Every committed saver scope produces exactly one audit entry holding a
//! redacted structural diff between the record before and after the change.
//!
//! # Architecture
//!
//! - `diff`: the recursive structural diff engine.
//! - `redaction`: exclusion and hidden key paths applied while diffing.
//! - `AuditEntry`: one immutable log entry with the diff, timestamp and the
//!   identity of whoever made the change.
//! - `AuditLog`: append-only line-delimited JSON (JSONL) file used by the
//!   file-backed store.
//!
//! # Example
//!
//! ```rust,ignore
//! use docsaver::audit::{diff, RedactionPolicy};
//!
//! let policy = RedactionPolicy::default().hide("password");
//! let changes = diff(&before.to_document(), &after.to_document(), &policy);
//! for line in changes.summary() {
//!     println!("{}", line);
//! }
//! ```

mod diff;
mod entry;
mod log;
mod redaction;

pub use diff::{diff, Change, Diff};
pub use entry::{AuditEntry, Operation};
pub use log::AuditLog;
pub use redaction::{KeyPath, RedactionPolicy, HIDDEN_MARKER};
