//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout (config dir holds both settings and the terminology mapping):
//!
//!   Windows: %APPDATA%\term-mapper\
//!   macOS:   ~/Library/Application Support/term-mapper/
//!   Linux:   ~/.config/term-mapper/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml` and `terminology_mapping.json`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Default location of the persisted terminology mapping.
    pub mapping_file: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "term-mapper";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("settings.toml");
        let mapping_file = config_dir.join("terminology_mapping.json");

        Self {
            config_dir,
            settings_file,
            mapping_file,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_non_empty() {
        let paths = AppPaths::new();
        assert!(paths.config_dir.to_str().is_some_and(|s| !s.is_empty()));
        assert!(paths
            .settings_file
            .file_name()
            .is_some_and(|n| n == "settings.toml"));
        assert!(paths
            .mapping_file
            .file_name()
            .is_some_and(|n| n == "terminology_mapping.json"));
    }

    #[test]
    fn files_live_in_config_dir() {
        let paths = AppPaths::new();
        assert_eq!(paths.settings_file.parent(), Some(paths.config_dir.as_path()));
        assert_eq!(paths.mapping_file.parent(), Some(paths.config_dir.as_path()));
    }
}
