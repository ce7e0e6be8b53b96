//! Site settings for docsaver
//!
//! Settings are read from `settings.json` in the data root and may be
//! overridden by a small set of environment variables.

use serde::{Deserialize, Serialize};

use super::paths::SaverPaths;
use crate::error::SaverError;

/// Settings for a docsaver site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Name of the site, shown by the `config` command
    #[serde(default = "default_site_name")]
    pub site_name: String,

    /// Emit debug-level diagnostics
    #[serde(default)]
    pub log_debug: bool,

    /// Minimum accepted password length for user accounts
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,

    /// Enable newly registered users without admin approval
    #[serde(default)]
    pub user_enable_immediately: bool,

    /// E-mail domain suffixes whose users are enabled immediately
    #[serde(default)]
    pub user_enable_email_whitelist: Vec<String>,

    /// Additional user fields whose values never appear in audit entries
    #[serde(default)]
    pub hidden_fields: Vec<String>,
}

fn default_schema_version() -> u32 {
    1
}

fn default_site_name() -> String {
    "docsaver".to_string()
}

fn default_min_password_length() -> usize {
    6
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            site_name: default_site_name(),
            log_debug: false,
            min_password_length: default_min_password_length(),
            user_enable_immediately: false,
            user_enable_email_whitelist: Vec::new(),
            hidden_fields: Vec::new(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &SaverPaths) -> Result<Self, SaverError> {
        let settings_path = paths.settings_file();

        let mut settings = if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| SaverError::Io(format!("Failed to read settings file: {}", e)))?;

            serde_json::from_str(&contents)
                .map_err(|e| SaverError::Config(format!("Failed to parse settings file: {}", e)))?
        } else {
            // Don't save yet - let caller decide when to persist
            Settings::default()
        };

        settings.apply_env();
        settings.validate()?;
        Ok(settings)
    }

    /// Override values from `DOCSAVER_DEBUG` and `DOCSAVER_SITE_NAME`
    pub fn apply_env(&mut self) {
        if let Ok(value) = std::env::var("DOCSAVER_DEBUG") {
            self.log_debug = to_bool(&value);
        }
        if let Ok(value) = std::env::var("DOCSAVER_SITE_NAME") {
            if !value.trim().is_empty() {
                self.site_name = value;
            }
        }
    }

    /// Sanity checks; the tool refuses to run with settings that fail these
    pub fn validate(&self) -> Result<(), SaverError> {
        if self.min_password_length <= 4 {
            return Err(SaverError::Config(format!(
                "min_password_length must be greater than 4, got {}",
                self.min_password_length
            )));
        }
        Ok(())
    }

    /// Save settings to disk
    pub fn save(&self, paths: &SaverPaths) -> Result<(), SaverError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| SaverError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| SaverError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    /// Does the e-mail address belong to a whitelisted domain?
    pub fn email_whitelisted(&self, email: &str) -> bool {
        let email = email.to_lowercase();
        self.user_enable_email_whitelist
            .iter()
            .any(|suffix| !suffix.is_empty() && email.ends_with(&suffix.to_lowercase()))
    }
}

/// Convert a string value into a boolean
fn to_bool(s: &str) -> bool {
    matches!(s.trim().to_lowercase().as_str(), "true" | "t" | "yes" | "y" | "1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.site_name, "docsaver");
        assert_eq!(settings.min_password_length, 6);
        assert!(!settings.user_enable_immediately);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = SaverPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.min_password_length = 10;
        settings.user_enable_immediately = true;
        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.min_password_length, 10);
        assert!(loaded.user_enable_immediately);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"site_name": "mysite"}"#).unwrap();
        assert_eq!(settings.site_name, "mysite");
        assert_eq!(settings.min_password_length, 6);
    }

    #[test]
    fn test_validate_rejects_short_password_length() {
        let settings = Settings {
            min_password_length: 3,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(SaverError::Config(_))));
    }

    #[test]
    fn test_email_whitelist() {
        let settings = Settings {
            user_enable_email_whitelist: vec!["@example.com".into()],
            ..Default::default()
        };
        assert!(settings.email_whitelisted("Alice@Example.com"));
        assert!(!settings.email_whitelisted("bob@other.org"));
    }

    #[test]
    fn test_to_bool() {
        assert!(to_bool("true"));
        assert!(to_bool("Y"));
        assert!(!to_bool("no"));
        assert!(!to_bool(""));
    }
}
