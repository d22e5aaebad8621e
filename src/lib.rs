//! Terminology correction for auto-generated captions.
//!
//! Builds a growing dictionary of domain terms by diffing machine
//! transcripts against human-corrected versions, then applies that
//! dictionary to new transcripts.
//!
//! # Architecture
//!
//! ```text
//!  original ─┐
//!            ├─▶ text::tokenize ─▶ diff::align ─▶ diff::diff_pair ─▶ CandidateTally
//! corrected ─┘                                                            │
//!                                              diff::review_candidates ◀──┘
//!                                                        │
//!                                                        ▼
//!                         mapping::merge ─▶ TerminologyMapping ─▶ persist / load
//!                                                        │
//!                    new transcript / segments ─▶ mapping::Replacer ─▶ corrected
//! ```
//!
//! The core operations are synchronous and return new values rather than
//! mutating their inputs.  Only [`batch`] and the mapping file helpers touch
//! the file system.

pub mod batch;
pub mod config;
pub mod diff;
pub mod mapping;
pub mod text;
