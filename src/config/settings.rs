//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files.  Every section is
//! `#[serde(default)]`, so a partial `settings.toml` only overrides the keys
//! it names.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::diff::ExtractOptions;

/// Environment variable that overrides the mapping file location.
pub const MAPPING_FILE_ENV: &str = "TERMINOLOGY_MAPPING_FILE";

// ---------------------------------------------------------------------------
// MappingConfig
// ---------------------------------------------------------------------------

/// Where the terminology mapping lives and how strictly it is loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Explicit mapping file.  `None` means the platform default from
    /// [`AppPaths::mapping_file`].
    pub file: Option<PathBuf>,
    /// Free-text description written into the mapping metadata.
    pub description: String,
    /// Fail the load when the declared `total_mappings` disagrees with the
    /// actual entry count, or when case-variant duplicate keys are found.
    pub strict: bool,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            file: None,
            description: "Terminology corrections for auto-generated captions".into(),
            strict: false,
        }
    }
}

// ---------------------------------------------------------------------------
// ExtractConfig
// ---------------------------------------------------------------------------

/// Settings for diff extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Candidates seen fewer times than this across a batch are dropped.
    pub min_count: u32,
    /// Longest phrase (in words) either side of a diff block may have.
    pub max_phrase_words: usize,
    /// Transcripts with more tokens than this are rejected by the aligner.
    pub max_alignment_tokens: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            min_count: 1,
            max_phrase_words: 4,
            max_alignment_tokens: 50_000,
        }
    }
}

impl ExtractConfig {
    /// Options handed to the phrase extractor.
    pub fn options(&self) -> ExtractOptions {
        ExtractOptions {
            max_phrase_words: self.max_phrase_words,
            max_alignment_tokens: self.max_alignment_tokens,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use term_mapper::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// println!("{}", config.mapping_path().display());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Mapping file settings.
    pub mapping: MappingConfig,
    /// Diff extraction settings.
    pub extract: ExtractConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario).
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Resolve the mapping file: `TERMINOLOGY_MAPPING_FILE`, then
    /// `[mapping].file`, then the platform default.
    pub fn mapping_path(&self) -> PathBuf {
        self.resolve_mapping_path(std::env::var_os(MAPPING_FILE_ENV).map(PathBuf::from))
    }

    fn resolve_mapping_path(&self, env_override: Option<PathBuf>) -> PathBuf {
        env_override
            .filter(|p| !p.as_os_str().is_empty())
            .or_else(|| self.mapping.file.clone())
            .unwrap_or_else(|| AppPaths::new().mapping_file)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
