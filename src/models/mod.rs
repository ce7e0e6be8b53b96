//! Core data models for docsaver
//!
//! Records, their identifiers and the revision tokens used for optimistic
//! concurrency control.

pub mod ids;
pub mod record;
pub mod revision;

pub use ids::{LogEntryId, RecordId};
pub use record::{format_time, now, AttachmentInfo, Fields, Record, RESERVED_KEYS};
pub use revision::Revision;
