//! Persistent terminology mapping.
//!
//! [`TerminologyMapping`] is a `phrase key → canonical correction` table plus
//! metadata, stored as pretty-printed JSON:
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "updated_at": "2026-10-14T09:30:00+00:00",
//!   "total_mappings": 2,
//!   "description": "Terminology corrections for auto-generated captions",
//!   "mappings": {
//!     "a key doe": "Aikido",
//!     "ear ream e": "irimi"
//!   }
//! }
//! ```
//!
//! A bare `{"wrong": "right"}` object is also accepted on load.
//!
//! The table only grows: [`merge`] inserts new keys and overwrites existing
//! ones, never removes.  The store does no locking; concurrent
//! `merge` + `persist` from several processes must be serialised by the
//! caller.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diff::PhraseCandidate;
use crate::text::{fold, phrase_key};

/// Schema version written by [`TerminologyMapping::persist`].
pub const MAPPING_VERSION: &str = "1.0";

// ---------------------------------------------------------------------------
// MappingError
// ---------------------------------------------------------------------------

/// Errors from loading, merging or saving a mapping.
#[derive(Debug, Error)]
pub enum MappingError {
    /// The persisted mapping is malformed or inconsistent.
    #[error("corrupt mapping: {0}")]
    Corrupt(String),

    /// An entry has an empty key or correction, or maps a phrase to itself.
    #[error("invalid mapping entry '{key}': {reason}")]
    Invalid { key: String, reason: &'static str },

    #[error("mapping file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialise mapping: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// On-disk shapes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum MappingFile {
    Structured(StoredMapping),
    Flat(BTreeMap<String, String>),
}

#[derive(Deserialize)]
struct StoredMapping {
    #[serde(default = "default_version")]
    version: String,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default)]
    total_mappings: Option<usize>,
    #[serde(default)]
    description: String,
    mappings: BTreeMap<String, String>,
}

fn default_version() -> String {
    MAPPING_VERSION.to_string()
}

// ---------------------------------------------------------------------------
// TerminologyMapping
// ---------------------------------------------------------------------------

/// Result of inserting one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    Added,
    /// The key existed with a different correction.
    Updated,
    Unchanged,
}

/// Counters returned by [`merge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub added: usize,
    pub updated: usize,
    pub unchanged: usize,
}

/// Ordered, case-insensitive phrase → correction table.
///
/// Keys are always in [`phrase_key`] form, so two keys can never be case
/// variants of each other.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerminologyMapping {
    pub version: String,
    pub updated_at: Option<String>,
    /// Entry count as of the last load or persist.  Use [`len`](Self::len)
    /// for the live count.
    pub total_mappings: usize,
    pub description: String,
    mappings: BTreeMap<String, String>,
}

impl Default for TerminologyMapping {
    fn default() -> Self {
        Self::new("")
    }
}

impl TerminologyMapping {
    /// An empty mapping (first run).
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            version: MAPPING_VERSION.to_string(),
            updated_at: None,
            total_mappings: 0,
            description: description.into(),
            mappings: BTreeMap::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Correction for `phrase`, matched case-insensitively.
    pub fn get(&self, phrase: &str) -> Option<&str> {
        self.mappings.get(&phrase_key(phrase)).map(String::as_str)
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.mappings.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Insert or overwrite one entry.
    ///
    /// # Errors
    ///
    /// [`MappingError::Invalid`] for an empty key or correction, or when the
    /// correction equals the key after case folding.
    pub fn insert(&mut self, original: &str, corrected: &str) -> Result<Insertion, MappingError> {
        let (key, value) = validate_entry(original, corrected)?;
        Ok(self.insert_unchecked(key, value))
    }

    fn insert_unchecked(&mut self, key: String, value: String) -> Insertion {
        match self.mappings.get_mut(&key) {
            Some(existing) if *existing == value => Insertion::Unchanged,
            Some(existing) => {
                log::info!("updating mapping: '{key}' -> '{value}' (was '{existing}')");
                *existing = value;
                Insertion::Updated
            }
            None => {
                log::info!("new mapping: '{key}' -> '{value}'");
                self.mappings.insert(key, value);
                Insertion::Added
            }
        }
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Load from `path`, tolerating inconsistencies (they are logged).
    /// A missing file yields an empty mapping.
    pub fn load(path: &Path) -> Result<Self, MappingError> {
        Self::load_with(path, false)
    }

    /// Load from `path`, failing with [`MappingError::Corrupt`] on a declared
    /// count mismatch, case-variant duplicate keys or invalid entries.
    pub fn load_strict(path: &Path) -> Result<Self, MappingError> {
        Self::load_with(path, true)
    }

    /// Load with the strictness chosen at runtime.
    pub fn load_with(path: &Path, strict: bool) -> Result<Self, MappingError> {
        if !path.exists() {
            log::info!("no mapping file at {}, starting empty", path.display());
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        let mapping = Self::parse(&data, strict)?;
        log::info!(
            "loaded {} terminology mappings from {}",
            mapping.len(),
            path.display()
        );
        Ok(mapping)
    }

    /// Parse the JSON form.
    pub fn parse(json: &str, strict: bool) -> Result<Self, MappingError> {
        let file: MappingFile =
            serde_json::from_str(json).map_err(|e| MappingError::Corrupt(e.to_string()))?;

        let (mut mapping, declared, raw) = match file {
            MappingFile::Structured(stored) => (
                Self {
                    version: stored.version,
                    updated_at: stored.updated_at,
                    total_mappings: 0,
                    description: stored.description,
                    mappings: BTreeMap::new(),
                },
                stored.total_mappings,
                stored.mappings,
            ),
            MappingFile::Flat(raw) => (Self::default(), None, raw),
        };

        let raw_len = raw.len();
        if let Some(declared) = declared.filter(|&d| d != raw_len) {
            let msg = format!("declares {declared} mappings but contains {raw_len}");
            if strict {
                return Err(MappingError::Corrupt(msg));
            }
            log::warn!("mapping file {msg}");
        }

        for (raw_key, raw_value) in raw {
            let (key, value) = match validate_entry(&raw_key, &raw_value) {
                Ok(entry) => entry,
                Err(e) if strict => return Err(MappingError::Corrupt(e.to_string())),
                Err(e) => {
                    log::warn!("dropping {e}");
                    continue;
                }
            };
            if let Some(previous) = mapping.mappings.insert(key.clone(), value) {
                let msg = format!("duplicate key '{key}' (case variant of '{raw_key}')");
                if strict {
                    return Err(MappingError::Corrupt(msg));
                }
                log::warn!("{msg}; dropped earlier value '{previous}'");
            }
        }

        mapping.total_mappings = mapping.len();
        Ok(mapping)
    }

    /// Pretty JSON with `total_mappings` recomputed from the live entries.
    pub fn to_json(&self) -> Result<String, MappingError> {
        let mut snapshot = self.clone();
        snapshot.total_mappings = snapshot.len();
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    /// Write to `path`, creating parent directories.  Stamps `updated_at`
    /// and recomputes `total_mappings`.
    pub fn persist(&mut self, path: &Path) -> Result<(), MappingError> {
        self.updated_at = Some(chrono::Local::now().to_rfc3339());
        self.total_mappings = self.len();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        log::info!("saved {} mappings to {}", self.len(), path.display());
        Ok(())
    }
}

/// Normalise and check one entry: folded phrase key, trimmed correction.
fn validate_entry(original: &str, corrected: &str) -> Result<(String, String), MappingError> {
    let key = phrase_key(original);
    let value = corrected.trim();
    if key.is_empty() {
        return Err(MappingError::Invalid {
            key: original.to_string(),
            reason: "key has no words",
        });
    }
    if value.is_empty() {
        return Err(MappingError::Invalid {
            key,
            reason: "correction is empty",
        });
    }
    if fold(value) == key {
        return Err(MappingError::Invalid {
            key,
            reason: "correction equals the key",
        });
    }
    Ok((key, value.to_string()))
}

// ---------------------------------------------------------------------------
// merge
// ---------------------------------------------------------------------------

/// Merge accepted candidates into `existing`.
///
/// Every candidate is validated before anything is applied, so an invalid
/// one leaves the mapping untouched.  Existing keys take the candidate's
/// correction (last merge wins); counts are not stored.
///
/// ```
/// use term_mapper::diff::PhraseCandidate;
/// use term_mapper::mapping::{merge, TerminologyMapping};
///
/// let (mapping, report) = merge(
///     TerminologyMapping::default(),
///     &[PhraseCandidate::new("ear ream e", "irimi", 1)],
/// )
/// .unwrap();
/// assert_eq!(mapping.get("Ear Ream E"), Some("irimi"));
/// assert_eq!(report.added, 1);
/// ```
pub fn merge(
    mut existing: TerminologyMapping,
    candidates: &[PhraseCandidate],
) -> Result<(TerminologyMapping, MergeReport), MappingError> {
    let entries = candidates
        .iter()
        .map(|c| validate_entry(&c.original, &c.corrected))
        .collect::<Result<Vec<_>, _>>()?;

    let mut report = MergeReport::default();
    for (key, value) in entries {
        match existing.insert_unchecked(key, value) {
            Insertion::Added => report.added += 1,
            Insertion::Updated => report.updated += 1,
            Insertion::Unchanged => report.unchanged += 1,
        }
    }
    Ok((existing, report))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
