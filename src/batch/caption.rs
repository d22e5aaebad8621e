//! Caption batch JSON: the hand-off format between caption download, human
//! spell-checking and this crate.
//!
//! ```json
//! {
//!   "batch_number": 1,
//!   "batch_size": 1,
//!   "created_at": "2026-10-14T09:30:00+00:00",
//!   "mapping_applied": false,
//!   "mapping_file": null,
//!   "videos": [
//!     {
//!       "video_id": "abc123",
//!       "title": "Sunday class",
//!       "url": "https://example.com/watch?v=abc123",
//!       "upload_date": "20261012",
//!       "segments": [{"start": 0.0, "end": 2.5, "text": "we practice ear ream e"}],
//!       "full_text": "we practice ear ream e"
//!     }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mapping::{Replacer, Segment, TerminologyMapping};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("batch file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid batch JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// All captions for one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoCaptions {
    pub video_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub upload_date: Option<String>,
    #[serde(default)]
    pub segments: Vec<Segment>,
    /// Concatenated text; the field humans usually correct.
    #[serde(default)]
    pub full_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionBatch {
    #[serde(default)]
    pub batch_number: u32,
    #[serde(default)]
    pub batch_size: usize,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub mapping_applied: bool,
    #[serde(default)]
    pub mapping_file: Option<String>,
    #[serde(default)]
    pub videos: Vec<VideoCaptions>,
}

impl CaptionBatch {
    pub fn load(path: &Path) -> Result<Self, BatchError> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), BatchError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        log::info!("saved batch to {}", path.display());
        Ok(())
    }
}

/// Collect `(original, corrected)` text pairs for diffing.
///
/// Videos are matched by `video_id`; ones missing from `corrected` are
/// skipped with a warning.  A video contributes its `full_text` pair when
/// both sides have one, otherwise its segments matched on identical
/// `(start, end)` times.
pub fn pair_batches(original: &CaptionBatch, corrected: &CaptionBatch) -> Vec<(String, String)> {
    let lookup: HashMap<&str, &VideoCaptions> = corrected
        .videos
        .iter()
        .map(|v| (v.video_id.as_str(), v))
        .collect();

    let mut pairs = Vec::new();
    for video in &original.videos {
        let Some(fixed) = lookup.get(video.video_id.as_str()) else {
            log::warn!("video {} not found in corrected batch", video.video_id);
            continue;
        };

        if !video.full_text.is_empty() && !fixed.full_text.is_empty() {
            pairs.push((video.full_text.clone(), fixed.full_text.clone()));
            continue;
        }

        let by_time: HashMap<(u64, u64), &Segment> = fixed
            .segments
            .iter()
            .map(|s| ((s.start_time.to_bits(), s.end_time.to_bits()), s))
            .collect();
        for seg in &video.segments {
            if let Some(other) = by_time.get(&(seg.start_time.to_bits(), seg.end_time.to_bits())) {
                pairs.push((seg.text.clone(), other.text.clone()));
            }
        }
    }
    log::debug!("paired {} transcripts", pairs.len());
    pairs
}

/// Copy of `batch` with `mapping` applied to every video's full text and
/// segments.
pub fn apply_mapping(
    batch: &CaptionBatch,
    mapping: &TerminologyMapping,
    mapping_file: Option<&Path>,
) -> CaptionBatch {
    let replacer = Replacer::new(mapping);
    let applied = !replacer.is_empty();

    let videos = batch
        .videos
        .iter()
        .map(|video| VideoCaptions {
            full_text: replacer.apply(&video.full_text),
            segments: replacer.apply_to_segments(&video.segments),
            ..video.clone()
        })
        .collect::<Vec<_>>();

    CaptionBatch {
        batch_size: videos.len(),
        mapping_applied: applied,
        mapping_file: mapping_file
            .filter(|_| applied)
            .map(|p| p.display().to_string()),
        videos,
        ..batch.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
