//! Display formatting for terminal output
//!
//! Formats users, records and audit entries as plain text for the
//! command-line tool.

pub mod record;
pub mod user;

pub use record::{format_logs, format_record};
pub use user::{format_user_details, format_user_list};
