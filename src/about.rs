//! Software information shown by `docsaver config`

/// Crate name
pub const SOURCE_NAME: &str = env!("CARGO_PKG_NAME");

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// One component of the running software
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Software {
    pub name: &'static str,
    pub version: String,
}

/// The tool itself plus the formats it reads and writes
pub fn software(settings_schema: u32) -> Vec<Software> {
    vec![
        Software {
            name: SOURCE_NAME,
            version: VERSION.to_string(),
        },
        Software {
            name: "settings schema",
            version: settings_schema.to_string(),
        },
        Software {
            name: "audit log format",
            version: "jsonl".to_string(),
        },
    ]
}
