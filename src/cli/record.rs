//! Record CLI commands
//!
//! Inspect any record by identifier and manage its attachments.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Subcommand;

use crate::display::{format_logs, format_record};
use crate::error::{SaverError, SaverResult};
use crate::identity::Identity;
use crate::models::RecordId;
use crate::saver::{PlainKind, Saver};
use crate::storage::RecordStore;

/// Record subcommands
#[derive(Subcommand)]
pub enum RecordCommands {
    /// Show a record
    Show {
        /// Record ID
        id: String,
    },
    /// Show the change log of a record
    Logs {
        /// Record ID
        id: String,
    },
    /// Attach a file to a record
    Attach {
        /// Record ID
        id: String,
        /// File to attach
        file: PathBuf,
        /// Attachment name (defaults to the file name)
        #[arg(short, long)]
        name: Option<String>,
        /// Content type (guessed from the extension if omitted)
        #[arg(short, long)]
        mime: Option<String>,
    },
    /// Remove an attachment from a record
    Detach {
        /// Record ID
        id: String,
        /// Attachment name
        filename: String,
    },
    /// Write an attachment to a file or standard output
    Get {
        /// Record ID
        id: String,
        /// Attachment name
        filename: String,
        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Handle a record command
pub fn handle_record_command(
    store: &dyn RecordStore,
    identity: &Identity,
    hidden: &[&str],
    cmd: RecordCommands,
) -> SaverResult<()> {
    match cmd {
        RecordCommands::Show { id } => {
            let record = store.fetch(parse_id(&id)?)?;
            print!("{}", format_record(&record, hidden));
        }

        RecordCommands::Logs { id } => {
            let entries = store.logs_for(parse_id(&id)?)?;
            println!("{}", format_logs(&entries));
        }

        RecordCommands::Attach { id, file, name, mime } => {
            let record = store.fetch(parse_id(&id)?)?;
            let name = match name {
                Some(n) => n,
                None => file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or_else(|| {
                        SaverError::Validation(format!("No file name in {}", file.display()))
                    })?,
            };
            let mime = mime.unwrap_or_else(|| guess_mime(&file).to_string());
            let content = fs::read(&file)
                .map_err(|e| SaverError::Io(format!("Failed to read {}: {}", file.display(), e)))?;
            let size = content.len();

            let kind = PlainKind::new(record.doctype.clone());
            let committed = Saver::update(store, identity, kind, record)?
                .scope(|saver| saver.add_attachment(name.clone(), content, mime.clone()))?;

            println!("Attached '{}' ({}, {} bytes)", name, mime, size);
            if let Some(rev) = &committed.record.rev {
                println!("  Revision: {}", rev);
            }
        }

        RecordCommands::Detach { id, filename } => {
            let record = store.fetch(parse_id(&id)?)?;
            let kind = PlainKind::new(record.doctype.clone());
            Saver::update(store, identity, kind, record)?
                .scope(|saver| saver.delete_attachment(&filename))?;
            println!("Removed '{}'", filename);
        }

        RecordCommands::Get { id, filename, output } => {
            let content = store.get_attachment(parse_id(&id)?, &filename)?;
            match output {
                Some(path) => {
                    fs::write(&path, &content).map_err(|e| {
                        SaverError::Io(format!("Failed to write {}: {}", path.display(), e))
                    })?;
                    println!("Wrote {} bytes to {}", content.len(), path.display());
                }
                None => io::stdout().write_all(&content)?,
            }
        }
    }

    Ok(())
}

fn parse_id(id: &str) -> SaverResult<RecordId> {
    RecordId::parse(id.trim())
        .map_err(|_| SaverError::Validation(format!("Invalid record ID: '{}'", id)))
}

/// Content type from the file extension
fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "txt" | "md" => "text/plain",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
