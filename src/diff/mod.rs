//! Diff extraction: discover terminology fixes by aligning transcripts.
//!
//! ```text
//! original text ──tokenize──┐
//!                           ├─▶ align ─▶ AlignmentOp* ─▶ diff_pair ─▶ PhraseCandidate*
//! corrected text ─tokenize──┘                                              │
//!                                                                           ▼
//!                          CandidateTally (sum counts, pick canonical spelling)
//!                                                                           │
//!                                        min_count filter ─▶ review_candidates
//! ```
//!
//! # Quick start
//!
//! ```rust
//! use term_mapper::diff::{extract_batch, ExtractOptions};
//!
//! let pairs = [("we practice ear ream e today", "we practice irimi today")];
//! let found = extract_batch(&pairs, &ExtractOptions::default(), 1).unwrap();
//! assert_eq!(found[0].original, "ear ream e");
//! assert_eq!(found[0].corrected, "irimi");
//! ```

pub mod align;
pub mod extract;
pub mod review;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use align::{align, align_bounded, AlignmentError, AlignmentOp};
pub use extract::{
    diff_pair, extract_batch, extract_batch_concurrent, extract_candidates, CandidateTally,
    ExtractOptions, PhraseCandidate,
};
pub use review::{review_candidates, ReviewDecision, Reviewer};
