//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the saver and record store.

pub mod record;
pub mod user;

pub use record::{handle_record_command, RecordCommands};
pub use user::{handle_user_command, UserCommands};
