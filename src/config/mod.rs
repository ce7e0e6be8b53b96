//! Configuration module for docsaver
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - Site settings persistence with environment overrides

pub mod paths;
pub mod settings;

pub use paths::SaverPaths;
pub use settings::Settings;
