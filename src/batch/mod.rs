//! Caption batch files: pairing original and spell-checked batches for
//! diffing, applying a mapping to a batch, and WebVTT export.

pub mod caption;
pub mod vtt;

pub use caption::{apply_mapping, pair_batches, BatchError, CaptionBatch, VideoCaptions};
pub use vtt::{segments_to_vtt, vtt_file_name, vtt_timestamp};
