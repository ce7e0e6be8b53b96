//! Path management for docsaver
//!
//! Provides XDG-compliant path resolution for settings, records, the audit
//! log and attachment payloads.
//!
//! ## Path Resolution Order
//!
//! 1. `DOCSAVER_DATA_DIR` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_DATA_HOME/docsaver` or `~/.local/share/docsaver`
//! 3. Windows: `%APPDATA%\docsaver`

use std::path::PathBuf;

use crate::error::SaverError;

/// Manages all paths used by docsaver
#[derive(Debug, Clone)]
pub struct SaverPaths {
    /// Base directory for all docsaver data
    base_dir: PathBuf,
}

impl SaverPaths {
    /// Create a new SaverPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, SaverError> {
        let base_dir = if let Ok(custom) = std::env::var("DOCSAVER_DATA_DIR") {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create SaverPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the directory holding attachment payloads, one subdirectory per record
    pub fn attachments_dir(&self) -> PathBuf {
        self.base_dir.join("attachments")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("settings.json")
    }

    /// Get the path to the append-only audit log
    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// Get the path to records.json
    pub fn records_file(&self) -> PathBuf {
        self.data_dir().join("records.json")
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<(), SaverError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| SaverError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| SaverError::Io(format!("Failed to create data directory: {}", e)))?;

        std::fs::create_dir_all(self.attachments_dir()).map_err(|e| {
            SaverError::Io(format!("Failed to create attachments directory: {}", e))
        })?;

        Ok(())
    }

    /// Check if docsaver has been initialized (settings file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

/// Resolve the default data directory path based on platform
#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, SaverError> {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return Ok(PathBuf::from(data_home).join("docsaver"));
    }
    let home = std::env::var("HOME")
        .map_err(|_| SaverError::Config("HOME environment variable not set".into()))?;
    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join("docsaver"))
}

/// Resolve the default data directory path based on platform
#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, SaverError> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| SaverError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("docsaver"))
}
