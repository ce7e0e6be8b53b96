//! Record and audit entry display formatting

use serde_json::Value;

use crate::audit::{AuditEntry, HIDDEN_MARKER};
use crate::models::{format_time, Record};

/// Format a record with its header, fields and attachments
///
/// Values of `hidden` fields are masked.
pub fn format_record(record: &Record, hidden: &[&str]) -> String {
    let mut output = String::new();
    output.push_str(&format!("Record: {}\n", record.id));
    output.push_str(&format!("  Type:      {}\n", record.doctype));
    if let Some(rev) = &record.rev {
        output.push_str(&format!("  Revision:  {}\n", rev));
    }
    output.push_str(&format!("  Created:   {}\n", format_time(&record.created)));
    output.push_str(&format!("  Modified:  {}\n", format_time(&record.modified)));

    if !record.fields.is_empty() {
        output.push_str("\nFields:\n");
        let width = record.fields.keys().map(String::len).max().unwrap_or(0);
        for (key, value) in &record.fields {
            let shown = if hidden.contains(&key.as_str()) {
                HIDDEN_MARKER.to_string()
            } else {
                match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                }
            };
            output.push_str(&format!("  {:<width$}  {}\n", key, shown, width = width));
        }
    }

    if !record.attachments.is_empty() {
        output.push_str("\nAttachments:\n");
        for (name, info) in &record.attachments {
            output.push_str(&format!(
                "  {} ({}, {} bytes)\n",
                name, info.content_type, info.length
            ));
        }
    }

    output
}

/// Format audit entries, one block per entry
pub fn format_logs(entries: &[AuditEntry]) -> String {
    if entries.is_empty() {
        return "No log entries found.".to_string();
    }
    entries
        .iter()
        .map(AuditEntry::format_human_readable)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttachmentInfo;

    #[test]
    fn test_format_record() {
        let mut record = Record::new("note");
        record.set("title", "Hello").unwrap();
        record.set("count", 3).unwrap();
        record.set("password", "secret").unwrap();
        record.attachments.insert(
            "a.txt".into(),
            AttachmentInfo {
                content_type: "text/plain".into(),
                length: 5,
            },
        );

        let output = format_record(&record, &["password"]);
        assert!(output.contains("Type:      note"));
        assert!(output.contains("Hello"));
        assert!(output.contains("count     3"));
        assert!(!output.contains("secret"));
        assert!(output.contains("a.txt (text/plain, 5 bytes)"));
    }

    #[test]
    fn test_empty_logs() {
        assert_eq!(format_logs(&[]), "No log entries found.");
    }
}
