//! docsaver - change-tracked document saver
//!
//! This library keeps JSON-like records in a pluggable store and writes an
//! immutable audit entry for every committed change. Each entry holds a
//! structural diff of the record (added, removed and updated keys) with
//! excluded paths dropped and hidden paths masked.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Path management and site settings
//! - `error`: Custom error types
//! - `models`: Records, identifiers and revision tokens
//! - `identity`: The acting principal recorded in audit entries
//! - `audit`: Diff engine, redaction policy, audit entries and the log file
//! - `storage`: The `RecordStore` trait with in-memory and file-backed stores
//! - `saver`: The scoped create-or-update transaction
//! - `users`: User accounts built on the saver
//! - `cli`, `display`: The command-line tool
//!
//! # Example
//!
//! ```rust,ignore
//! use docsaver::config::{SaverPaths, Settings};
//! use docsaver::identity::Identity;
//! use docsaver::storage::FileStore;
//! use docsaver::users::{UserKind, UserSaver};
//!
//! let paths = SaverPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let store = FileStore::open(&paths)?;
//! let identity = Identity::user("admin");
//!
//! UserSaver::create(&store, &identity, UserKind::new(&settings))?.scope(|saver| {
//!     saver.set_username("alice")?;
//!     saver.set_email("alice@example.com")?;
//!     saver.set_password("correct horse")
//! })?;
//! ```

pub mod about;
pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod identity;
pub mod models;
pub mod saver;
pub mod storage;
pub mod users;

pub use error::{SaverError, SaverResult};
pub use saver::{Committed, Saver};
